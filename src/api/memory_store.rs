use std::cell::{Cell, RefCell};
use std::future::{self, Future};

use crate::core::RawMomentPoint;
use crate::error::{TimelineError, TimelineResult};

use super::{TimelineQuery, TimelineQueryRequest, TimelineQueryResponse};

/// Hard per-request row cap enforced by the store, independent of the request limit.
pub const STORE_ROW_CAP: usize = 2_000;

/// One stored record plus its ownership metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMoment {
    pub point: RawMomentPoint,
    pub owner_id: Option<String>,
    pub is_public: bool,
}

impl StoredMoment {
    #[must_use]
    pub fn public(point: RawMomentPoint) -> Self {
        Self {
            point,
            owner_id: None,
            is_public: true,
        }
    }

    #[must_use]
    pub fn owned(point: RawMomentPoint, owner_id: impl Into<String>, is_public: bool) -> Self {
        Self {
            point,
            owner_id: Some(owner_id.into()),
            is_public,
        }
    }
}

/// Forced failure for exercising the gateway's fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFailure {
    /// The request never produced a response.
    Transport(String),
    /// A response arrived with `success = false`.
    Server(String),
}

/// In-memory record store answering timeline queries with raw points.
///
/// Applies the range and visibility filters, sorts ascending by timestamp
/// and caps the result at `min(request.limit, STORE_ROW_CAP)` rows.
#[derive(Debug, Default)]
pub struct InMemoryMomentStore {
    moments: Vec<StoredMoment>,
    failure: RefCell<Option<StoreFailure>>,
    query_count: Cell<usize>,
}

impl InMemoryMomentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_moments(moments: impl IntoIterator<Item = StoredMoment>) -> Self {
        Self {
            moments: moments.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn insert(&mut self, moment: StoredMoment) {
        self.moments.push(moment);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Number of queries answered so far, failed ones included.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.query_count.get()
    }

    pub fn set_failure(&self, failure: Option<StoreFailure>) {
        self.failure.replace(failure);
    }

    fn answer(&self, request: &TimelineQueryRequest) -> TimelineResult<TimelineQueryResponse> {
        match self.failure.borrow().as_ref() {
            Some(StoreFailure::Transport(reason)) => {
                return Err(TimelineError::Transport(reason.clone()));
            }
            Some(StoreFailure::Server(reason)) => {
                return Ok(TimelineQueryResponse::failure(reason.clone()));
            }
            None => {}
        }

        let Some(window) = request.window() else {
            return Ok(TimelineQueryResponse::failure(format!(
                "invalid date range {}..{}",
                request.start_date, request.end_date
            )));
        };

        let mut matched: Vec<_> = self
            .moments
            .iter()
            .filter(|moment| {
                request
                    .visibility
                    .admits(moment.owner_id.as_deref(), moment.is_public)
            })
            .filter_map(|moment| {
                let time = moment.point.parsed_timestamp()?;
                window.contains(time).then_some((time, &moment.point))
            })
            .collect();
        matched.sort_by_key(|(time, _)| *time);

        let cap = usize::try_from(request.limit)
            .unwrap_or(usize::MAX)
            .min(STORE_ROW_CAP);
        let points = matched
            .into_iter()
            .take(cap)
            .map(|(_, point)| point.clone())
            .collect();
        Ok(TimelineQueryResponse::with_points(points))
    }
}

impl TimelineQuery for InMemoryMomentStore {
    fn query(
        &self,
        request: TimelineQueryRequest,
    ) -> impl Future<Output = TimelineResult<TimelineQueryResponse>> {
        self.query_count.set(self.query_count.get() + 1);
        future::ready(self.answer(&request))
    }
}
