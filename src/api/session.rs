use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::core::{Clock, SystemClock, TimeBucket, TimeScale, TimeWindow, ViewState, Viewport};
use crate::error::TimelineResult;
use crate::interaction::{NavigationCommand, NavigationOutcome};
use crate::render::RenderFrame;

use super::{
    BucketSource, ChartRenderer, DataFetchGateway, FetchOutcome, NavigationController,
    TimelineConfig, TimelineQuery,
};

/// What the view currently shows.
///
/// `buckets`, `window` and `scale` always belong to the same applied fetch;
/// while a newer fetch is in flight they keep their previous values and
/// `loading` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DisplayState {
    pub buckets: Vec<TimeBucket>,
    pub window: Option<TimeWindow>,
    pub scale: Option<TimeScale>,
    pub loading: bool,
    /// Non-blocking notice shown while fallback data is displayed.
    pub banner: Option<String>,
    /// Generation of the fetch whose result is displayed (0 before the first).
    pub generation: u64,
}

/// Result of one session fetch once it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    Applied { generation: u64, fallback: bool },
    Discarded { generation: u64, latest: u64 },
}

/// Navigation, fetching and displayed state for one mounted timeline view.
///
/// Single-threaded: every method takes `&self`, state lives behind
/// `RefCell`, and no borrow is held across an await point.
#[derive(Debug)]
pub struct TimelineSession<Q> {
    navigation: RefCell<NavigationController>,
    gateway: DataFetchGateway<Q>,
    display: RefCell<DisplayState>,
}

impl<Q: TimelineQuery> TimelineSession<Q> {
    pub fn new(query: Q, config: TimelineConfig) -> TimelineResult<Self> {
        Self::with_clock(query, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        query: Q,
        config: TimelineConfig,
        clock: Arc<dyn Clock>,
    ) -> TimelineResult<Self> {
        config.validate()?;
        let navigation = NavigationController::with_clock(config.default_scale, clock)
            .with_bounds(config.navigation)?;
        let gateway =
            DataFetchGateway::new(query, config.fetch)?.with_visibility(config.visibility);
        Ok(Self {
            navigation: RefCell::new(navigation),
            gateway,
            display: RefCell::new(DisplayState::default()),
        })
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.navigation.borrow().view_state()
    }

    /// Window for the current view state; may differ from the displayed one
    /// while a fetch is in flight.
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.navigation.borrow().window()
    }

    #[must_use]
    pub fn display(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    #[must_use]
    pub fn gateway(&self) -> &DataFetchGateway<Q> {
        &self.gateway
    }

    /// Applies a navigation command. Returns the fetch for the new window when
    /// the view state changed, `None` for a no-op.
    pub fn dispatch(
        &self,
        command: NavigationCommand,
    ) -> Option<impl Future<Output = SessionUpdate> + '_> {
        let outcome = self.navigation.borrow_mut().apply(command);
        match outcome {
            NavigationOutcome::Unchanged => None,
            NavigationOutcome::Moved | NavigationOutcome::ResetToNow => Some(self.refresh()),
        }
    }

    /// Fetches the window for the current view state (initial load or retry).
    pub fn refresh(&self) -> impl Future<Output = SessionUpdate> + '_ {
        let (window, scale) = {
            let navigation = self.navigation.borrow();
            (navigation.window(), navigation.scale())
        };
        let fetch = self.gateway.fetch(window, scale);
        self.display.borrow_mut().loading = true;

        async move {
            match fetch.await {
                FetchOutcome::Applied(fetched) => {
                    let fallback = fetched.source.is_fallback();
                    let generation = fetched.generation;
                    let bucket_count = fetched.buckets.len();
                    let mut state = self.display.borrow_mut();
                    state.banner = match &fetched.source {
                        BucketSource::Fallback { reason } => {
                            Some(format!("Showing sample data: {reason}"))
                        }
                        BucketSource::Network | BucketSource::Cache => None,
                    };
                    state.buckets = fetched.buckets;
                    state.window = Some(fetched.window);
                    state.scale = Some(fetched.scale);
                    state.generation = generation;
                    state.loading = false;
                    drop(state);
                    debug!(
                        generation,
                        buckets = bucket_count,
                        fallback,
                        "applied timeline buckets"
                    );
                    SessionUpdate::Applied {
                        generation,
                        fallback,
                    }
                }
                FetchOutcome::Superseded { generation, latest } => {
                    SessionUpdate::Discarded { generation, latest }
                }
            }
        }
    }

    /// Chart frame for the displayed buckets. `None` before the first fetch lands.
    pub fn chart_frame(
        &self,
        chart: &ChartRenderer,
        viewport: Viewport,
    ) -> TimelineResult<Option<RenderFrame>> {
        let display = self.display.borrow();
        let (Some(window), Some(scale)) = (display.window, display.scale) else {
            return Ok(None);
        };
        let today = self.navigation.borrow().now();
        chart
            .build_frame(&display.buckets, window, scale, viewport, today)
            .map(Some)
    }
}
