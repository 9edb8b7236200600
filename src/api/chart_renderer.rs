use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::primitives::datetime_to_unix_seconds;
use crate::core::{CountScale, LinearScale, TimeBucket, TimeScale, TimeWindow, Viewport};
use crate::error::{TimelineError, TimelineResult};
use crate::render::{
    CirclePrimitive, LinePrimitive, LineStrokeStyle, RenderFrame, Renderer, TextHAlign,
    TextPrimitive,
};

use super::ChartStyle;
use super::config::validate_chart_style;
use super::label_format::{format_count, scale_indicator};

const STAR_MARKER: &str = "\u{2605}";

/// One bucket projected into pixel space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub starred: bool,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlotArea {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

/// Scatter view over buckets: x follows `bucket_start` across the window,
/// y follows `count`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRenderer {
    style: ChartStyle,
}

impl ChartRenderer {
    pub fn new(style: ChartStyle) -> TimelineResult<Self> {
        validate_chart_style(&style)?;
        Ok(Self { style })
    }

    #[must_use]
    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// `min + ln(count + 1)`, clamped to the configured radius range.
    #[must_use]
    pub fn point_radius(&self, count: u64) -> f64 {
        let min = self.style.min_point_radius_px;
        let max = self.style.max_point_radius_px;
        (min + (count as f64).ln_1p()).clamp(min, max)
    }

    pub fn project(
        &self,
        buckets: &[TimeBucket],
        window: TimeWindow,
        viewport: Viewport,
    ) -> TimelineResult<Vec<ChartPoint>> {
        let plot = self.plot_area(viewport)?;
        let (time_scale, count_scale) = self.scales(buckets, window, plot)?;

        Ok(buckets
            .iter()
            .map(|bucket| ChartPoint {
                key: bucket.key.clone(),
                x: time_scale
                    .map(datetime_to_unix_seconds(bucket.bucket_start))
                    .clamp(plot.left, plot.right),
                y: count_scale.count_to_pixel(bucket.count as f64),
                radius: self.point_radius(bucket.count),
                starred: bucket.is_starred(),
                count: bucket.count,
            })
            .collect())
    }

    /// Materializes axes, count ticks, bucket markers, the today marker and
    /// the scale indicator.
    pub fn build_frame(
        &self,
        buckets: &[TimeBucket],
        window: TimeWindow,
        scale: TimeScale,
        viewport: Viewport,
        today: DateTime<Utc>,
    ) -> TimelineResult<RenderFrame> {
        let plot = self.plot_area(viewport)?;
        let (time_scale, count_scale) = self.scales(buckets, window, plot)?;
        let style = &self.style;
        let font = style.label_font_size_px;
        let mut frame = RenderFrame::new(viewport);

        frame = frame
            .with_line(LinePrimitive::new(
                plot.left,
                plot.bottom,
                plot.right,
                plot.bottom,
                1.0,
                style.axis_color,
            ))
            .with_line(LinePrimitive::new(
                plot.left,
                plot.top,
                plot.left,
                plot.bottom,
                1.0,
                style.axis_color,
            ));

        for value in tick_values(count_scale.max_count(), style.y_tick_count) {
            let y = count_scale.count_to_pixel(value as f64);
            frame = frame
                .with_line(LinePrimitive::new(
                    plot.left - 4.0,
                    y,
                    plot.left,
                    y,
                    1.0,
                    style.axis_color,
                ))
                .with_text(TextPrimitive::new(
                    format_count(value),
                    plot.left - 8.0,
                    y,
                    font,
                    style.label_color,
                    TextHAlign::Right,
                ));
        }

        for point in self.project(buckets, window, viewport)? {
            let fill = if point.starred {
                style.starred_point_color
            } else {
                style.point_color
            };
            frame = frame.with_circle(
                CirclePrimitive::new(point.x, point.y, point.radius, fill)
                    .with_stroke(style.point_outline_color, 1.0),
            );
            if point.starred {
                frame = frame.with_text(TextPrimitive::new(
                    STAR_MARKER,
                    point.x,
                    point.y - point.radius - 4.0,
                    font,
                    style.starred_point_color,
                    TextHAlign::Center,
                ));
            }
        }

        if style.show_today && window.contains(today) {
            let x = time_scale.map(datetime_to_unix_seconds(today));
            frame = frame
                .with_line(
                    LinePrimitive::new(x, plot.top, x, plot.bottom, 2.0, style.today_color)
                        .with_stroke_style(LineStrokeStyle::Dashed),
                )
                .with_text(TextPrimitive::new(
                    "Today",
                    x,
                    plot.top - 8.0,
                    font,
                    style.today_color,
                    TextHAlign::Center,
                ));
        }

        frame = frame.with_text(TextPrimitive::new(
            scale_indicator(scale),
            plot.right,
            plot.bottom + style.margins.bottom / 2.0,
            font,
            style.label_color,
            TextHAlign::Right,
        ));

        frame.validate()?;
        Ok(frame)
    }

    pub fn render<R: Renderer>(
        &self,
        renderer: &mut R,
        buckets: &[TimeBucket],
        window: TimeWindow,
        scale: TimeScale,
        viewport: Viewport,
        today: DateTime<Utc>,
    ) -> TimelineResult<()> {
        let frame = self.build_frame(buckets, window, scale, viewport, today)?;
        renderer.render(&frame)
    }

    fn plot_area(&self, viewport: Viewport) -> TimelineResult<PlotArea> {
        let margins = self.style.margins;
        let plot = PlotArea {
            left: margins.left,
            right: f64::from(viewport.width) - margins.right,
            top: margins.top,
            bottom: f64::from(viewport.height) - margins.bottom,
        };
        if !viewport.is_valid() || plot.right <= plot.left || plot.bottom <= plot.top {
            return Err(TimelineError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        Ok(plot)
    }

    fn scales(
        &self,
        buckets: &[TimeBucket],
        window: TimeWindow,
        plot: PlotArea,
    ) -> TimelineResult<(LinearScale, CountScale)> {
        let (start, end) = window.unix_range();
        let time_scale = LinearScale::new(start, end, plot.left, plot.right)?;
        let max_count = buckets.iter().map(|bucket| bucket.count).max().unwrap_or(0);
        let count_scale = CountScale::new(
            self.style.count_scale_mode,
            max_count,
            plot.bottom,
            plot.top,
        )?;
        Ok((time_scale, count_scale))
    }
}

/// Evenly spaced whole-number tick values from 0 to `max_count`, deduplicated.
fn tick_values(max_count: u64, tick_count: usize) -> Vec<u64> {
    if tick_count < 2 {
        return vec![0];
    }
    let steps = (tick_count - 1) as u64;
    let mut values: Vec<u64> = (0..=steps)
        .map(|step| ((max_count as f64) * (step as f64) / (steps as f64)).round() as u64)
        .collect();
    values.dedup();
    values
}
