use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};

/// Affine map from a domain interval onto a pixel interval.
///
/// The pixel interval may be descending (e.g. a Y axis growing upwards).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(
        domain_start: f64,
        domain_end: f64,
        range_start: f64,
        range_end: f64,
    ) -> TimelineResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(TimelineError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }
        if !range_start.is_finite() || !range_end.is_finite() {
            return Err(TimelineError::InvalidData(
                "scale range must be finite".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
            range_start,
            range_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    #[must_use]
    pub fn map(self, value: f64) -> f64 {
        let normalized = (value - self.domain_start) / (self.domain_end - self.domain_start);
        self.range_start + normalized * (self.range_end - self.range_start)
    }

    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        let normalized = (pixel - self.range_start) / (self.range_end - self.range_start);
        self.domain_start + normalized * (self.domain_end - self.domain_start)
    }
}

/// Mapping mode for bucket counts on the chart's Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CountScaleMode {
    #[default]
    Linear,
    /// `ln(1 + count)`, so zero stays at the baseline.
    Log,
}

/// Y-axis scale from `[0, max_count]` onto a pixel interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountScale {
    mode: CountScaleMode,
    linear: LinearScale,
    max_count: u64,
}

impl CountScale {
    /// Builds the scale; an all-zero data set still gets a `[0, 1]` domain.
    pub fn new(
        mode: CountScaleMode,
        max_count: u64,
        baseline_px: f64,
        top_px: f64,
    ) -> TimelineResult<Self> {
        let max_count = max_count.max(1);
        let linear = LinearScale::new(0.0, transform(mode, max_count as f64), baseline_px, top_px)?;
        Ok(Self {
            mode,
            linear,
            max_count,
        })
    }

    #[must_use]
    pub fn mode(self) -> CountScaleMode {
        self.mode
    }

    #[must_use]
    pub fn max_count(self) -> u64 {
        self.max_count
    }

    #[must_use]
    pub fn count_to_pixel(self, count: f64) -> f64 {
        self.linear.map(transform(self.mode, count.max(0.0)))
    }
}

fn transform(mode: CountScaleMode, count: f64) -> f64 {
    match mode {
        CountScaleMode::Linear => count,
        CountScaleMode::Log => count.ln_1p(),
    }
}
