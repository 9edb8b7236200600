mod chart_renderer;
mod config;
mod fetch_cache;
mod fetch_gateway;
mod label_format;
mod memory_store;
mod navigation;
mod query;
mod session;
mod virtual_list;

pub use chart_renderer::{ChartPoint, ChartRenderer};
pub use config::{
    ChartMargins, ChartStyle, FetchConfig, NavigationBounds, TimelineConfig, VirtualListConfig,
};
pub use fetch_cache::WindowCacheStats;
pub use fetch_gateway::{BucketSource, DataFetchGateway, FetchFailure, FetchOutcome, FetchedBuckets};
pub use label_format::{bucket_label, format_count, scale_indicator};
pub use memory_store::{InMemoryMomentStore, STORE_ROW_CAP, StoreFailure, StoredMoment};
pub use navigation::NavigationController;
pub use query::{
    QueryPayload, TimelineQuery, TimelineQueryRequest, TimelineQueryResponse, Visibility,
};
pub use session::{DisplayState, SessionUpdate, TimelineSession};
pub use virtual_list::{VirtualFrame, VirtualList};
