mod frame;
mod null_renderer;
mod primitives;
mod row;

pub use frame::RenderFrame;
pub use null_renderer::{NullRenderer, NullRowRenderer};
pub use primitives::{
    CirclePrimitive, Color, LinePrimitive, LineStrokeStyle, TextHAlign, TextPrimitive,
};
pub use row::{SlotId, VirtualRow};

use crate::error::TimelineResult;

/// Contract implemented by any chart rendering backend.
///
/// Backends receive a fully materialized, deterministic `RenderFrame` so
/// drawing code remains isolated from timeline domain and navigation logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> TimelineResult<()>;
}

/// Contract implemented by list backends driven by the virtual list.
///
/// Rows arrive in ascending item order. A backend keeps one widget per
/// `SlotId` and only rebuilds its content when `VirtualRow::rebound` is set.
pub trait RowRenderer<T> {
    fn begin_frame(&mut self) {}

    fn render_row(&mut self, row: &VirtualRow, item: &T) -> TimelineResult<()>;

    /// Called instead of any rows when the list has no items.
    fn render_empty(&mut self) -> TimelineResult<()>;
}
