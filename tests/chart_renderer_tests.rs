use approx::assert_abs_diff_eq;
use chrono::{DateTime, TimeZone, Utc};
use moment_timeline::api::{ChartRenderer, ChartStyle};
use moment_timeline::core::{CountScaleMode, TimeBucket, TimeScale, TimeWindow, Viewport};
use moment_timeline::render::{LineStrokeStyle, NullRenderer};

fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn bucket(start: DateTime<Utc>, count: u64, star_count: u64) -> TimeBucket {
    TimeBucket {
        key: TimeScale::Month.bucket_key(start),
        bucket_start: start,
        count,
        star_count,
        total_weight: count,
        representative_item: None,
    }
}

fn window() -> TimeWindow {
    TimeWindow::new(utc(2024, 1, 1), utc(2025, 1, 1)).expect("window")
}

fn viewport() -> Viewport {
    Viewport::new(800, 400)
}

#[test]
fn radius_grows_logarithmically_and_is_clamped() {
    let chart = ChartRenderer::new(ChartStyle::default()).expect("chart");
    assert_abs_diff_eq!(chart.point_radius(0), 4.0);
    assert_abs_diff_eq!(chart.point_radius(1), 4.0 + 2f64.ln(), epsilon = 1e-12);
    assert!(chart.point_radius(10) < chart.point_radius(100));
    assert_abs_diff_eq!(chart.point_radius(1_000_000_000), 12.0);
}

#[test]
fn projection_maps_time_to_x_and_count_to_y() {
    let chart = ChartRenderer::new(ChartStyle::default()).expect("chart");
    let buckets = vec![
        bucket(utc(2024, 1, 1), 50, 0),
        bucket(utc(2025, 1, 1), 100, 0),
    ];

    let points = chart.project(&buckets, window(), viewport()).expect("project");
    assert_abs_diff_eq!(points[0].x, 60.0, epsilon = 1e-9);
    assert_abs_diff_eq!(points[1].x, 760.0, epsilon = 1e-9);
    assert_abs_diff_eq!(points[0].y, 190.0, epsilon = 1e-9);
    assert_abs_diff_eq!(points[1].y, 40.0, epsilon = 1e-9);
    assert!(points[1].radius > points[0].radius);
}

#[test]
fn log_mode_keeps_max_count_at_top() {
    let style = ChartStyle {
        count_scale_mode: CountScaleMode::Log,
        ..ChartStyle::default()
    };
    let chart = ChartRenderer::new(style).expect("chart");
    let buckets = vec![bucket(utc(2024, 3, 1), 1, 0), bucket(utc(2024, 4, 1), 1_000, 0)];

    let points = chart.project(&buckets, window(), viewport()).expect("project");
    assert_abs_diff_eq!(points[1].y, 40.0, epsilon = 1e-9);
    assert!(points[0].y < 340.0 && points[0].y > 190.0);
}

#[test]
fn starred_buckets_get_distinct_marker() {
    let style = ChartStyle::default();
    let chart = ChartRenderer::new(style).expect("chart");
    let buckets = vec![bucket(utc(2024, 3, 1), 10, 2), bucket(utc(2024, 4, 1), 10, 0)];

    let frame = chart
        .build_frame(&buckets, window(), TimeScale::Month, viewport(), utc(2030, 1, 1))
        .expect("frame");
    assert_eq!(frame.circles.len(), 2);
    assert_eq!(frame.circles[0].fill_color, style.starred_point_color);
    assert_eq!(frame.circles[1].fill_color, style.point_color);
    assert_eq!(
        frame
            .texts
            .iter()
            .filter(|text| text.text == "\u{2605}")
            .count(),
        1
    );
    assert!(frame.texts.iter().any(|text| text.text == "Scale: Month"));
}

#[test]
fn today_marker_only_inside_window() {
    let chart = ChartRenderer::new(ChartStyle::default()).expect("chart");
    let buckets = vec![bucket(utc(2024, 3, 1), 10, 0)];
    let dashed = |today: DateTime<Utc>| {
        let frame = chart
            .build_frame(&buckets, window(), TimeScale::Month, viewport(), today)
            .expect("frame");
        frame
            .lines
            .iter()
            .filter(|line| line.stroke_style == LineStrokeStyle::Dashed)
            .count()
    };

    assert_eq!(dashed(utc(2024, 7, 1)), 1);
    assert_eq!(dashed(utc(2026, 7, 1)), 0);
}

#[test]
fn y_ticks_use_compact_count_labels() {
    let chart = ChartRenderer::new(ChartStyle::default()).expect("chart");
    let buckets = vec![bucket(utc(2024, 3, 1), 4_000, 0)];
    let frame = chart
        .build_frame(&buckets, window(), TimeScale::Month, viewport(), utc(2030, 1, 1))
        .expect("frame");

    for label in ["0", "1.0K", "2.0K", "3.0K", "4.0K"] {
        assert!(frame.texts.iter().any(|text| text.text == label), "{label}");
    }
}

#[test]
fn empty_bucket_list_still_renders_axes() {
    let chart = ChartRenderer::new(ChartStyle::default()).expect("chart");
    let mut renderer = NullRenderer::default();
    chart
        .render(&mut renderer, &[], window(), TimeScale::Year, viewport(), utc(2030, 1, 1))
        .expect("render");
    assert_eq!(renderer.last_circle_count, 0);
    assert!(renderer.last_line_count >= 2);
}

#[test]
fn invalid_geometry_is_rejected() {
    let chart = ChartRenderer::new(ChartStyle::default()).expect("chart");
    assert!(chart.project(&[], window(), Viewport::new(50, 50)).is_err());

    let inverted = ChartStyle {
        min_point_radius_px: 20.0,
        max_point_radius_px: 5.0,
        ..ChartStyle::default()
    };
    assert!(ChartRenderer::new(inverted).is_err());
}
