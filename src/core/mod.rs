pub mod aggregation;
pub mod clock;
pub mod fallback;
pub mod primitives;
pub mod scale;
pub mod time_scale;
pub mod time_window;
pub mod types;
pub mod windowing;

pub use aggregation::{AggregationReport, aggregate, aggregate_with_report, normalize_buckets};
pub use clock::{Clock, FixedClock, SystemClock};
pub use fallback::{MAX_FALLBACK_BUCKETS, fallback_buckets, fallback_seed};
pub use scale::{CountScale, CountScaleMode, LinearScale};
pub use time_scale::{ScaleSpan, TimeScale};
pub use time_window::{TimeWindow, compute_window, compute_window_at, max_window};
pub use types::{RawMomentPoint, TimeBucket, ViewState, Viewport};
pub use windowing::{HeightIndex, ViewportWindow, compute_viewport_window, viewport_capacity};
