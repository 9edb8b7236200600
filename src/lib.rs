//! moment-timeline: time-scale aware browsing of timestamped moment records.
//!
//! `core` holds the pure domain (scales, windows, aggregation, windowing
//! math), `api` the stateful surfaces (navigation, fetching, virtual list,
//! chart), and `render` the backend-agnostic draw contracts.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{
    ChartRenderer, DataFetchGateway, NavigationController, TimelineConfig, TimelineSession,
    VirtualList,
};
pub use core::{RawMomentPoint, TimeBucket, TimeScale, TimeWindow, aggregate, compute_window};
pub use error::{TimelineError, TimelineResult};
