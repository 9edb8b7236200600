use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::TimeScale;
use crate::core::primitives::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// One moment record as delivered by the query layer.
///
/// The timestamp stays in its wire form; records whose timestamp does not
/// parse are skipped by aggregation rather than rejected at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMomentPoint {
    pub timestamp: String,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub source_id: String,
}

fn default_weight() -> u32 {
    1
}

impl RawMomentPoint {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, source_id: impl Into<String>) -> Self {
        Self {
            timestamp: format_timestamp(timestamp),
            is_starred: false,
            weight: 1,
            source_id: source_id.into(),
        }
    }

    /// Builds a point from an unvalidated wire timestamp.
    #[must_use]
    pub fn from_wire(timestamp: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            is_starred: false,
            weight: 1,
            source_id: source_id.into(),
        }
    }

    #[must_use]
    pub fn starred(mut self, is_starred: bool) -> Self {
        self.is_starred = is_starred;
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Weight with the `>= 1` floor applied.
    #[must_use]
    pub fn effective_weight(&self) -> u32 {
        self.weight.max(1)
    }
}

/// Aggregated group of points sharing a truncated time key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    pub key: String,
    pub bucket_start: DateTime<Utc>,
    pub count: u64,
    pub star_count: u64,
    #[serde(default)]
    pub total_weight: u64,
    #[serde(default)]
    pub representative_item: Option<RawMomentPoint>,
}

impl TimeBucket {
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.star_count > 0
    }
}

/// Navigation state: the active zoom level and the date it is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub scale: TimeScale,
    pub center_date: DateTime<Utc>,
}

impl ViewState {
    #[must_use]
    pub fn new(scale: TimeScale, center_date: DateTime<Utc>) -> Self {
        Self { scale, center_date }
    }
}
