use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::core::primitives::clamp_to_calendar;
use crate::core::{Clock, SystemClock, TimeScale, TimeWindow, ViewState, compute_window_at};
use crate::error::TimelineResult;
use crate::interaction::{NavigationCommand, NavigationOutcome};

use super::NavigationBounds;
use super::config::validate_navigation_bounds;

/// Explicit state machine over `ViewState`.
///
/// Transitions:
/// - `zoom_in` / `zoom_out` step through `TimeScale` order; no-op at either end.
/// - `pan_forward` / `pan_backward` move the center by `steps` half spans.
///   Coarse scales (`decade` and up) reset the center to now when the result
///   leaves `NavigationBounds`; finer scales clamp to the calendar bound.
/// - `jump_to_today` recenters on now and keeps the scale.
///
/// Boundary inputs are silent no-ops reported as `NavigationOutcome::Unchanged`.
#[derive(Debug, Clone)]
pub struct NavigationController {
    state: ViewState,
    bounds: NavigationBounds,
    clock: Arc<dyn Clock>,
}

impl NavigationController {
    /// Starts at `scale = day`, centered on the system clock's now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(TimeScale::Day, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(scale: TimeScale, clock: Arc<dyn Clock>) -> Self {
        let state = ViewState::new(scale, clock.now());
        Self {
            state,
            bounds: NavigationBounds::default(),
            clock,
        }
    }

    pub fn with_bounds(mut self, bounds: NavigationBounds) -> TimelineResult<Self> {
        validate_navigation_bounds(bounds)?;
        self.bounds = bounds;
        Ok(self)
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.state
    }

    #[must_use]
    pub fn scale(&self) -> TimeScale {
        self.state.scale
    }

    #[must_use]
    pub fn center_date(&self) -> DateTime<Utc> {
        self.state.center_date
    }

    #[must_use]
    pub fn bounds(&self) -> NavigationBounds {
        self.bounds
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Window derived from the current state.
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        compute_window_at(self.state.scale, self.state.center_date, self.clock.now())
    }

    pub fn apply(&mut self, command: NavigationCommand) -> NavigationOutcome {
        let outcome = match command {
            NavigationCommand::ZoomIn => self.zoom_in(),
            NavigationCommand::ZoomOut => self.zoom_out(),
            NavigationCommand::PanForward { steps } => self.pan_forward(steps),
            NavigationCommand::PanBackward { steps } => self.pan_backward(steps),
            NavigationCommand::JumpToToday => self.jump_to_today(),
        };
        debug!(
            ?command,
            ?outcome,
            scale = %self.state.scale,
            center = %self.state.center_date,
            "navigation transition"
        );
        outcome
    }

    pub fn zoom_in(&mut self) -> NavigationOutcome {
        self.set_scale_if(self.state.scale.finer())
    }

    pub fn zoom_out(&mut self) -> NavigationOutcome {
        self.set_scale_if(self.state.scale.coarser())
    }

    pub fn pan_forward(&mut self, steps: u32) -> NavigationOutcome {
        self.pan(i64::from(steps))
    }

    pub fn pan_backward(&mut self, steps: u32) -> NavigationOutcome {
        self.pan(-i64::from(steps))
    }

    pub fn jump_to_today(&mut self) -> NavigationOutcome {
        self.state.center_date = self.clock.now();
        NavigationOutcome::Moved
    }

    /// Direct scale selection (e.g. a scale picker). Same-scale selection is a no-op.
    pub fn set_scale(&mut self, scale: TimeScale) -> NavigationOutcome {
        self.set_scale_if((scale != self.state.scale).then_some(scale))
    }

    /// Direct center selection (e.g. a date picker), clamped to the calendar bound.
    pub fn set_center_date(&mut self, center: DateTime<Utc>) -> NavigationOutcome {
        let center = clamp_to_calendar(center, self.clock.now());
        if center == self.state.center_date {
            return NavigationOutcome::Unchanged;
        }
        self.state.center_date = center;
        NavigationOutcome::Moved
    }

    fn set_scale_if(&mut self, scale: Option<TimeScale>) -> NavigationOutcome {
        match scale {
            Some(scale) => {
                self.state.scale = scale;
                NavigationOutcome::Moved
            }
            None => NavigationOutcome::Unchanged,
        }
    }

    fn pan(&mut self, signed_steps: i64) -> NavigationOutcome {
        if signed_steps == 0 {
            return NavigationOutcome::Unchanged;
        }

        let scale = self.state.scale;
        let candidate = scale.half_span().shift(self.state.center_date, signed_steps);

        if scale.is_coarse() {
            return match candidate {
                Some(center) if self.bounds.contains_year(center.year()) => {
                    self.state.center_date = center;
                    NavigationOutcome::Moved
                }
                _ => {
                    debug!(
                        scale = %scale,
                        steps = signed_steps,
                        min_year = self.bounds.min_year,
                        max_year = self.bounds.max_year,
                        "pan left navigable years; resetting center to now"
                    );
                    self.state.center_date = self.clock.now();
                    NavigationOutcome::ResetToNow
                }
            };
        }

        match candidate {
            Some(center) => {
                self.state.center_date = clamp_to_calendar(center, self.clock.now());
                NavigationOutcome::Moved
            }
            None => NavigationOutcome::Unchanged,
        }
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}
