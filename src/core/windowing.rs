use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};

/// Visible index range of a virtualized list plus its overscan margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportWindow {
    pub first_visible_index: usize,
    pub last_visible_index: usize,
    pub overscan: usize,
}

impl ViewportWindow {
    /// `[first - overscan, last + overscan]` clamped to `[0, item_count - 1]`,
    /// as a half-open range. Empty when `item_count == 0`.
    #[must_use]
    pub fn rendered_range(self, item_count: usize) -> Range<usize> {
        if item_count == 0 {
            return 0..0;
        }
        let start = self.first_visible_index.saturating_sub(self.overscan);
        let end = self
            .last_visible_index
            .saturating_add(self.overscan)
            .min(item_count - 1);
        start.min(end)..end + 1
    }

    #[must_use]
    pub fn visible_len(self) -> usize {
        self.last_visible_index - self.first_visible_index + 1
    }
}

/// Per-item heights with O(log n) prefix sums and offset lookups.
///
/// Every item starts at the estimate; `measure` replaces it with the real
/// height once the row has been laid out. Backed by a Fenwick tree so that
/// neither scrolling nor measuring touches every item.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightIndex {
    estimate_px: f64,
    heights: Vec<f64>,
    tree: Vec<f64>,
    measured: Vec<bool>,
}

impl HeightIndex {
    pub fn with_estimate(item_count: usize, estimate_px: f64) -> TimelineResult<Self> {
        validate_height(estimate_px, "row height estimate")?;

        let heights = vec![estimate_px; item_count];
        let mut tree = vec![0.0; item_count + 1];
        for index in 1..=item_count {
            tree[index] += estimate_px;
            let parent = index + lowest_bit(index);
            if parent <= item_count {
                tree[parent] += tree[index];
            }
        }

        Ok(Self {
            estimate_px,
            heights,
            tree,
            measured: vec![false; item_count],
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
    pub fn estimate_px(&self) -> f64 {
        self.estimate_px
    }

    #[must_use]
    pub fn measured_count(&self) -> usize {
        self.measured.iter().filter(|measured| **measured).count()
    }

    #[must_use]
    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn height_of(&self, index: usize) -> Option<f64> {
        self.heights.get(index).copied()
    }

    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.offset_of(self.len())
    }

    /// Sum of the heights of items `0..index`.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> f64 {
        let mut cursor = index.min(self.len());
        let mut sum = 0.0;
        while cursor > 0 {
            sum += self.tree[cursor];
            cursor -= lowest_bit(cursor);
        }
        sum
    }

    /// Replaces the height of one item. Returns the height delta applied.
    pub fn measure(&mut self, index: usize, height_px: f64) -> TimelineResult<f64> {
        validate_height(height_px, "measured row height")?;
        let Some(previous) = self.heights.get(index).copied() else {
            return Err(TimelineError::InvalidData(format!(
                "row index {index} out of bounds for {} rows",
                self.len()
            )));
        };

        let delta = height_px - previous;
        self.heights[index] = height_px;
        self.measured[index] = true;

        let mut cursor = index + 1;
        while cursor <= self.len() {
            self.tree[cursor] += delta;
            cursor += lowest_bit(cursor);
        }
        Ok(delta)
    }

    /// Index of the item covering `offset_px`, clamped to the last item.
    /// `None` for an empty index.
    #[must_use]
    pub fn index_at_offset(&self, offset_px: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        let mut position = 0usize;
        let mut remaining = offset_px.max(0.0);
        let mut step = highest_power_of_two_at_most(self.len());
        while step > 0 {
            let next = position + step;
            if next <= self.len() && self.tree[next] <= remaining {
                position = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        Some(position.min(self.len() - 1))
    }
}

/// Resolves which items intersect `[scroll_offset_px, scroll_offset_px + viewport_height_px)`.
///
/// The visible range always spans at least [`viewport_capacity`] items (as
/// far as the list allows), so the window size does not depend on whether
/// the offset falls on a row boundary.
#[must_use]
pub fn compute_viewport_window(
    heights: &HeightIndex,
    scroll_offset_px: f64,
    viewport_height_px: f64,
    overscan: usize,
) -> Option<ViewportWindow> {
    let first_visible_index = heights.index_at_offset(scroll_offset_px)?;
    let viewport_end = scroll_offset_px.max(0.0) + viewport_height_px.max(0.0);
    let mut last_visible_index = heights.index_at_offset(viewport_end)?;
    if last_visible_index > first_visible_index
        && heights.offset_of(last_visible_index) >= viewport_end
    {
        last_visible_index -= 1;
    }

    let capacity = viewport_capacity(viewport_height_px, heights.estimate_px());
    let filled = first_visible_index
        .saturating_add(capacity - 1)
        .min(heights.len() - 1);
    last_visible_index = last_visible_index.max(filled);

    Some(ViewportWindow {
        first_visible_index,
        last_visible_index,
        overscan,
    })
}

/// Most estimate-height rows that can intersect the viewport at once,
/// counting a partially shown row at each edge.
#[must_use]
pub fn viewport_capacity(viewport_height_px: f64, estimate_px: f64) -> usize {
    if estimate_px <= 0.0 || viewport_height_px <= 0.0 {
        return 1;
    }
    (viewport_height_px / estimate_px).ceil() as usize + 1
}

fn validate_height(height_px: f64, what: &str) -> TimelineResult<()> {
    if !height_px.is_finite() || height_px <= 0.0 {
        return Err(TimelineError::InvalidData(format!(
            "{what} must be finite and > 0"
        )));
    }
    Ok(())
}

fn lowest_bit(value: usize) -> usize {
    value & value.wrapping_neg()
}

fn highest_power_of_two_at_most(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - value.leading_zeros())
    }
}
