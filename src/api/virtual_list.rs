use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Range;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::core::{HeightIndex, ViewportWindow, compute_viewport_window, viewport_capacity};
use crate::error::{TimelineError, TimelineResult};
use crate::render::{RowRenderer, SlotId, VirtualRow};

use super::VirtualListConfig;
use super::config::validate_virtual_list_config;

/// Rows to draw for the current scroll position.
#[derive(Debug, Clone, PartialEq)]
pub enum VirtualFrame {
    /// The list has no items; backends draw an explicit empty state.
    Empty,
    Rows {
        window: ViewportWindow,
        rendered: Range<usize>,
        total_height_px: f64,
        rows: Vec<VirtualRow>,
    },
}

impl VirtualFrame {
    #[must_use]
    pub fn rows(&self) -> &[VirtualRow] {
        match self {
            Self::Empty => &[],
            Self::Rows { rows, .. } => rows,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Render slots bound to item indices. Freed slots are reused before new
/// ones are allocated, so the slot count tracks the rendered row count.
#[derive(Debug, Default)]
struct SlotPool {
    bound: IndexMap<usize, SlotId>,
    free: SmallVec<[SlotId; 16]>,
    allocated: usize,
}

impl SlotPool {
    fn release_outside(&mut self, keep: &Range<usize>) {
        let free = &mut self.free;
        self.bound.retain(|index, slot| {
            let retained = keep.contains(index);
            if !retained {
                free.push(*slot);
            }
            retained
        });
    }

    /// Returns the slot for `index` and whether it was (re)bound this frame.
    fn acquire(&mut self, index: usize) -> (SlotId, bool) {
        if let Some(slot) = self.bound.get(&index) {
            return (*slot, false);
        }
        let slot = self.free.pop().unwrap_or_else(|| {
            let slot = SlotId(self.allocated);
            self.allocated += 1;
            slot
        });
        self.bound.insert(index, slot);
        (slot, true)
    }

    fn release_all(&mut self) {
        self.free.extend(self.bound.drain(..).map(|(_, slot)| slot));
    }
}

/// Windowed list over an arbitrary number of variable-height items.
///
/// Only rows intersecting the viewport (plus `overscan` rows on each side)
/// are produced. Heights start at the configured estimate and are replaced
/// through [`VirtualList::measure`]; the total scroll height is always the
/// sum of the current heights.
#[derive(Debug)]
pub struct VirtualList {
    heights: HeightIndex,
    config: VirtualListConfig,
    scroll_offset_px: f64,
    slots: SlotPool,
    /// Content fingerprints of the rows last handed to a row renderer.
    drawn: IndexMap<usize, u64>,
}

impl VirtualList {
    pub fn new(item_count: usize, config: VirtualListConfig) -> TimelineResult<Self> {
        validate_virtual_list_config(config)?;
        Ok(Self {
            heights: HeightIndex::with_estimate(item_count, config.estimated_row_height_px)?,
            config,
            scroll_offset_px: 0.0,
            slots: SlotPool::default(),
            drawn: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> VirtualListConfig {
        self.config
    }

    #[must_use]
    pub fn scroll_offset_px(&self) -> f64 {
        self.scroll_offset_px
    }

    #[must_use]
    pub fn total_height_px(&self) -> f64 {
        self.heights.total_height()
    }

    /// Most rows of estimated height that can intersect the viewport at once.
    #[must_use]
    pub fn viewport_capacity(&self) -> usize {
        viewport_capacity(
            self.config.viewport_height_px,
            self.config.estimated_row_height_px,
        )
    }

    /// Render slots created so far.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.allocated
    }

    #[must_use]
    pub fn height_index(&self) -> &HeightIndex {
        &self.heights
    }

    /// Replaces the item set. All measurements and slot bindings are reset.
    pub fn set_item_count(&mut self, item_count: usize) -> TimelineResult<()> {
        self.heights = HeightIndex::with_estimate(item_count, self.config.estimated_row_height_px)?;
        self.slots.release_all();
        self.drawn.clear();
        self.scroll_offset_px = self.clamped_offset(self.scroll_offset_px);
        Ok(())
    }

    /// Scrolls to `offset_px`, clamped to `[0, total_height - viewport_height]`.
    pub fn scroll_to(&mut self, offset_px: f64) {
        let offset_px = if offset_px.is_finite() { offset_px } else { 0.0 };
        self.scroll_offset_px = self.clamped_offset(offset_px);
    }

    /// Scrolls so `index` is the first visible row (as far as the end allows).
    pub fn scroll_to_index(&mut self, index: usize) {
        if self.is_empty() {
            self.scroll_offset_px = 0.0;
            return;
        }
        let index = index.min(self.len() - 1);
        self.scroll_to(self.heights.offset_of(index));
    }

    pub fn resize(&mut self, viewport_height_px: f64) -> TimelineResult<()> {
        if !viewport_height_px.is_finite() || viewport_height_px < 0.0 {
            return Err(TimelineError::InvalidData(
                "viewport height must be finite and >= 0".to_owned(),
            ));
        }
        self.config.viewport_height_px = viewport_height_px;
        self.scroll_offset_px = self.clamped_offset(self.scroll_offset_px);
        Ok(())
    }

    /// Records the laid-out height of `index`.
    ///
    /// When the row sits above the current scroll position the offset moves
    /// by the same delta, keeping the visible rows in place.
    pub fn measure(&mut self, index: usize, height_px: f64) -> TimelineResult<()> {
        let anchored = self
            .heights
            .index_at_offset(self.scroll_offset_px)
            .is_some_and(|first| index < first);
        let delta = self.heights.measure(index, height_px)?;
        if anchored {
            self.scroll_offset_px = self.clamped_offset(self.scroll_offset_px + delta);
        }
        Ok(())
    }

    #[must_use]
    pub fn viewport_window(&self) -> Option<ViewportWindow> {
        compute_viewport_window(
            &self.heights,
            self.scroll_offset_px,
            self.config.viewport_height_px,
            self.config.overscan,
        )
    }

    /// Places the rendered rows for the current scroll position, recycling
    /// slots of rows that left the rendered range.
    pub fn frame(&mut self) -> VirtualFrame {
        let Some(window) = self.viewport_window() else {
            self.slots.release_all();
            return VirtualFrame::Empty;
        };

        let rendered = window.rendered_range(self.len());
        self.slots.release_outside(&rendered);

        let mut rows = Vec::with_capacity(rendered.len());
        let mut top_px = self.heights.offset_of(rendered.start);
        for index in rendered.clone() {
            let height_px = self.heights.height_of(index).unwrap_or(self.heights.estimate_px());
            let (slot, rebound) = self.slots.acquire(index);
            rows.push(VirtualRow {
                slot,
                index,
                top_px,
                height_px,
                rebound,
            });
            top_px += height_px;
        }

        trace!(
            first = window.first_visible_index,
            last = window.last_visible_index,
            rendered = rows.len(),
            slots = self.slots.allocated,
            "virtual list frame"
        );

        VirtualFrame::Rows {
            window,
            rendered,
            total_height_px: self.heights.total_height(),
            rows,
        }
    }

    /// Computes the frame for `items` and hands each placed row to `renderer`.
    ///
    /// The list is reset (slots unbound, measurements dropped) when `items`
    /// has a different length or when any row drawn last time now holds
    /// different content, so every row of a replaced item set is redrawn.
    /// Call [`VirtualList::set_item_count`] to reset explicitly.
    pub fn render<T, R>(&mut self, items: &[T], renderer: &mut R) -> TimelineResult<VirtualFrame>
    where
        T: Hash,
        R: RowRenderer<T>,
    {
        if items.len() != self.len() || self.drawn_content_changed(items) {
            debug!(
                previous = self.len(),
                items = items.len(),
                "virtual list item set replaced"
            );
            self.set_item_count(items.len())?;
        }

        let frame = self.frame();
        self.drawn.clear();
        renderer.begin_frame();
        if frame.is_empty() {
            renderer.render_empty()?;
            return Ok(frame);
        }
        for row in frame.rows() {
            if let Some(item) = items.get(row.index) {
                renderer.render_row(row, item)?;
                self.drawn.insert(row.index, fingerprint(item));
            }
        }
        Ok(frame)
    }

    fn drawn_content_changed<T: Hash>(&self, items: &[T]) -> bool {
        self.drawn.iter().any(|(index, drawn)| {
            items
                .get(*index)
                .is_none_or(|item| fingerprint(item) != *drawn)
        })
    }

    fn clamped_offset(&self, offset_px: f64) -> f64 {
        let max_offset = (self.heights.total_height() - self.config.viewport_height_px).max(0.0);
        offset_px.clamp(0.0, max_offset)
    }
}

fn fingerprint<T: Hash>(item: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    hasher.finish()
}
