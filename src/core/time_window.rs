use chrono::{DateTime, Datelike, TimeDelta, Utc};
use serde::Serialize;

use crate::core::TimeScale;
use crate::core::primitives::{
    FUTURE_YEAR_HEADROOM, MIN_CALENDAR_YEAR, calendar_bounds, datetime_to_unix_seconds,
    year_start,
};

/// Query/display range derived from a `ViewState`. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Builds a window from two instants in either order; `None` when they coincide.
    #[must_use]
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { start: a, end: b }),
            std::cmp::Ordering::Greater => Some(Self { start: b, end: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn span(self) -> TimeDelta {
        self.end - self.start
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(self, time: DateTime<Utc>) -> bool {
        time >= self.start && time <= self.end
    }

    #[must_use]
    pub fn unix_range(self) -> (f64, f64) {
        (
            datetime_to_unix_seconds(self.start),
            datetime_to_unix_seconds(self.end),
        )
    }
}

/// Fixed `max` window: `[MIN_CALENDAR_YEAR-01-01, (now.year + 101)-01-01)`.
#[must_use]
pub fn max_window(now: DateTime<Utc>) -> TimeWindow {
    let start = year_start(MIN_CALENDAR_YEAR).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let end = year_start(now.year().saturating_add(FUTURE_YEAR_HEADROOM + 1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    TimeWindow { start, end }
}

/// Computes the window for `scale` centered on `center`, reading "now" from the system clock.
#[must_use]
pub fn compute_window(scale: TimeScale, center: DateTime<Utc>) -> TimeWindow {
    compute_window_at(scale, center, Utc::now())
}

/// Deterministic window computation.
///
/// Every scale except `Max` is symmetric around `center` by its half span.
/// Edges that would leave chrono's representable range saturate at the
/// calendar bound instead of failing.
#[must_use]
pub fn compute_window_at(
    scale: TimeScale,
    center: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TimeWindow {
    if scale == TimeScale::Max {
        return max_window(now);
    }

    let (min_bound, max_bound) = calendar_bounds(now);
    let span = scale.half_span();
    let start = span.shift(center, -1).unwrap_or(min_bound);
    let end = span.shift(center, 1).unwrap_or(max_bound);
    TimeWindow::new(start, end).unwrap_or(TimeWindow {
        start: min_bound,
        end: max_bound,
    })
}
