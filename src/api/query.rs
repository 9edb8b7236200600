use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::core::primitives::{format_timestamp, parse_timestamp};
use crate::core::{RawMomentPoint, TimeBucket, TimeScale, TimeWindow};
use crate::error::TimelineResult;

/// Owner/visibility predicate forwarded to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    PublicOnly,
    #[serde(rename_all = "camelCase")]
    OwnerOrPublic { owner_id: String },
    #[serde(rename_all = "camelCase")]
    OwnerOnly { owner_id: String },
}

impl Visibility {
    #[must_use]
    pub fn admits(&self, owner_id: Option<&str>, is_public: bool) -> bool {
        match self {
            Self::PublicOnly => is_public,
            Self::OwnerOrPublic { owner_id: viewer } => {
                is_public || owner_id == Some(viewer.as_str())
            }
            Self::OwnerOnly { owner_id: viewer } => owner_id == Some(viewer.as_str()),
        }
    }
}

/// Request sent to the external query interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQueryRequest {
    pub scale: TimeScale,
    pub start_date: String,
    pub end_date: String,
    pub limit: u32,
    #[serde(default)]
    pub visibility: Visibility,
}

impl TimelineQueryRequest {
    #[must_use]
    pub fn for_window(
        window: TimeWindow,
        scale: TimeScale,
        limit: u32,
        visibility: Visibility,
    ) -> Self {
        Self {
            scale,
            start_date: format_timestamp(window.start()),
            end_date: format_timestamp(window.end()),
            limit,
            visibility,
        }
    }

    /// Parses the date range back; `None` when either edge is malformed.
    #[must_use]
    pub fn window(&self) -> Option<TimeWindow> {
        TimeWindow::new(
            parse_timestamp(&self.start_date)?,
            parse_timestamp(&self.end_date)?,
        )
    }
}

/// Query results: already bucketed, or raw points for client-side aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum QueryPayload {
    Buckets(Vec<TimeBucket>),
    Points(Vec<RawMomentPoint>),
}

impl Default for QueryPayload {
    fn default() -> Self {
        Self::Buckets(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQueryResponse {
    pub success: bool,
    #[serde(default, rename = "buckets")]
    pub payload: QueryPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TimelineQueryResponse {
    #[must_use]
    pub fn with_points(points: Vec<RawMomentPoint>) -> Self {
        Self {
            success: true,
            payload: QueryPayload::Points(points),
            error: None,
        }
    }

    #[must_use]
    pub fn with_buckets(buckets: Vec<TimeBucket>) -> Self {
        Self {
            success: true,
            payload: QueryPayload::Buckets(buckets),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: QueryPayload::default(),
            error: Some(error.into()),
        }
    }
}

/// External query interface consumed by the fetch gateway.
///
/// Implementations return `Err(TimelineError::Transport(..))` for transport
/// failures; the gateway absorbs every error into a fallback aggregate.
pub trait TimelineQuery {
    fn query(
        &self,
        request: TimelineQueryRequest,
    ) -> impl Future<Output = TimelineResult<TimelineQueryResponse>>;
}
