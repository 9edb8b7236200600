use std::cell::{Cell, RefCell};
use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::core::{
    TimeBucket, TimeScale, TimeWindow, aggregate_with_report, fallback_buckets, fallback_seed,
    normalize_buckets,
};
use crate::error::TimelineResult;

use super::config::validate_fetch_config;
use super::fetch_cache::{WindowCache, WindowCacheKey, WindowCacheStats};
use super::{
    FetchConfig, QueryPayload, TimelineQuery, TimelineQueryRequest, TimelineQueryResponse,
    Visibility,
};

/// Where a fetched bucket list came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum BucketSource {
    Network,
    Cache,
    /// Synthetic data produced because the query layer failed.
    Fallback { reason: String },
}

impl BucketSource {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Buckets for the generation that is still current when they resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedBuckets {
    pub generation: u64,
    pub window: TimeWindow,
    pub scale: TimeScale,
    pub buckets: Vec<TimeBucket>,
    pub source: BucketSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied(FetchedBuckets),
    /// A newer fetch was issued before this one resolved; the result was dropped.
    Superseded { generation: u64, latest: u64 },
}

impl FetchOutcome {
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Applied(fetched) => fetched.generation,
            Self::Superseded { generation, .. } => *generation,
        }
    }

    #[must_use]
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }

    #[must_use]
    pub fn into_applied(self) -> Option<FetchedBuckets> {
        match self {
            Self::Applied(fetched) => Some(fetched),
            Self::Superseded { .. } => None,
        }
    }
}

/// Side-channel record of the most recent transport or server failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub generation: u64,
    pub window: TimeWindow,
    pub scale: TimeScale,
    pub reason: String,
}

/// Issues window queries, caches results and drops superseded responses.
///
/// Every call to [`DataFetchGateway::fetch`] takes a new generation number
/// before returning. When the returned future resolves, its generation is
/// compared against the latest one issued; older results come back as
/// [`FetchOutcome::Superseded`] and must not be displayed.
///
/// Failures never surface as errors: the gateway answers with deterministic
/// fallback buckets and records a [`FetchFailure`].
#[derive(Debug)]
pub struct DataFetchGateway<Q> {
    query: Q,
    config: FetchConfig,
    visibility: Visibility,
    generation: Cell<u64>,
    cache: RefCell<WindowCache>,
    last_failure: RefCell<Option<FetchFailure>>,
}

impl<Q: TimelineQuery> DataFetchGateway<Q> {
    pub fn new(query: Q, config: FetchConfig) -> TimelineResult<Self> {
        validate_fetch_config(config)?;
        Ok(Self {
            query,
            config,
            visibility: Visibility::default(),
            generation: Cell::new(0),
            cache: RefCell::new(WindowCache::new(
                Duration::from_millis(config.cache_ttl_ms),
                config.cache_max_entries,
            )),
            last_failure: RefCell::new(None),
        })
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn query(&self) -> &Q {
        &self.query
    }

    #[must_use]
    pub fn config(&self) -> FetchConfig {
        self.config
    }

    #[must_use]
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Latest generation handed out by `fetch`.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.get()
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    #[must_use]
    pub fn cache_stats(&self) -> WindowCacheStats {
        self.cache.borrow().stats()
    }

    #[must_use]
    pub fn last_failure(&self) -> Option<FetchFailure> {
        self.last_failure.borrow().clone()
    }

    /// Starts a fetch for `window` at `scale`.
    ///
    /// The generation bump, the cache lookup and the query call all happen
    /// before this returns, so a later `fetch` always supersedes this one
    /// regardless of when either future is polled.
    pub fn fetch(
        &self,
        window: TimeWindow,
        scale: TimeScale,
    ) -> impl Future<Output = FetchOutcome> + '_ {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);

        let key = WindowCacheKey::new(window, scale);
        let cached = self.cache.borrow_mut().get(key, Instant::now());
        let pending = match cached {
            Some(_) => {
                trace!(generation, scale = %scale, "window cache hit");
                None
            }
            None => {
                let request = TimelineQueryRequest::for_window(
                    window,
                    scale,
                    self.config.limit,
                    self.visibility.clone(),
                );
                trace!(
                    generation,
                    scale = %scale,
                    start = %request.start_date,
                    end = %request.end_date,
                    "issuing window query"
                );
                Some(self.query.query(request))
            }
        };

        async move {
            let (buckets, source) = match (cached, pending) {
                (Some(buckets), _) => (buckets, BucketSource::Cache),
                (None, Some(pending)) => {
                    self.settle(pending.await, key, window, scale, generation)
                }
                (None, None) => (Vec::new(), BucketSource::Network),
            };

            let latest = self.generation.get();
            if latest != generation {
                debug!(generation, latest, scale = %scale, "discarding superseded fetch");
                return FetchOutcome::Superseded { generation, latest };
            }

            FetchOutcome::Applied(FetchedBuckets {
                generation,
                window,
                scale,
                buckets,
                source,
            })
        }
    }

    fn settle(
        &self,
        result: TimelineResult<TimelineQueryResponse>,
        key: WindowCacheKey,
        window: TimeWindow,
        scale: TimeScale,
        generation: u64,
    ) -> (Vec<TimeBucket>, BucketSource) {
        let reason = match result {
            Ok(response) if response.success => {
                let buckets = match response.payload {
                    QueryPayload::Points(points) => aggregate_with_report(&points, scale).buckets,
                    QueryPayload::Buckets(buckets) => normalize_buckets(buckets),
                };
                self.cache
                    .borrow_mut()
                    .insert(key, buckets.clone(), Instant::now());
                return (buckets, BucketSource::Network);
            }
            Ok(response) => response
                .error
                .unwrap_or_else(|| "query reported failure".to_owned()),
            Err(err) => err.to_string(),
        };

        warn!(
            generation,
            scale = %scale,
            reason = %reason,
            "window query failed; serving fallback buckets"
        );
        if self.is_current(generation) {
            self.last_failure.replace(Some(FetchFailure {
                generation,
                window,
                scale,
                reason: reason.clone(),
            }));
        }

        let seed = fallback_seed(self.config.fallback_seed, window, scale);
        (
            fallback_buckets(window, scale, seed),
            BucketSource::Fallback { reason },
        )
    }
}
