use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use moment_timeline::api::{NavigationController, VirtualList, VirtualListConfig};
use moment_timeline::core::{
    FixedClock, RawMomentPoint, TimeScale, aggregate, aggregate_with_report, compute_window_at,
};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

fn scale_strategy() -> impl Strategy<Value = TimeScale> {
    (0usize..TimeScale::ALL.len()).prop_map(|index| TimeScale::ALL[index])
}

fn center_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (-9_000i32..2_100, 1u32..=12, 1u32..=28, 0u32..24)
        .prop_map(|(year, month, day, hour)| {
            Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
        })
}

fn point_strategy() -> impl Strategy<Value = RawMomentPoint> {
    prop_oneof![
        8 => (-200_000_000_000i64..4_000_000_000i64, any::<bool>(), 1u32..10).prop_map(
            |(seconds, starred, weight)| {
                let time = DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default();
                RawMomentPoint::new(time, format!("p{seconds}"))
                    .starred(starred)
                    .with_weight(weight)
            }
        ),
        1 => "[a-z ]{0,12}".prop_map(|text| RawMomentPoint::from_wire(text, "junk")),
    ]
}

proptest! {
    #[test]
    fn windows_are_ordered_and_symmetric(scale in scale_strategy(), center in center_strategy()) {
        let window = compute_window_at(scale, center, now());
        prop_assert!(window.start() < window.end());

        let expected = match scale {
            TimeScale::Hour => Some(TimeDelta::hours(48)),
            TimeScale::Day => Some(TimeDelta::days(28)),
            TimeScale::Week => Some(TimeDelta::weeks(16)),
            _ => None,
        };
        if let Some(expected) = expected {
            prop_assert_eq!(window.span(), expected);
        }
        if scale != TimeScale::Max {
            prop_assert!(window.contains(center));
        }
    }

    #[test]
    fn aggregation_conserves_valid_points(
        points in prop::collection::vec(point_strategy(), 0..200),
        scale in scale_strategy(),
    ) {
        let valid = points.iter().filter(|point| point.parsed_timestamp().is_some()).count();
        let report = aggregate_with_report(&points, scale);

        let total: u64 = report.buckets.iter().map(|bucket| bucket.count).sum();
        prop_assert_eq!(total, valid as u64);
        prop_assert_eq!(report.accepted_points, valid);
        prop_assert_eq!(report.dropped_points, points.len() - valid);
        prop_assert!(report.buckets.iter().all(|bucket| bucket.count > 0));
        prop_assert!(report.buckets.iter().all(|bucket| bucket.star_count <= bucket.count));
    }

    #[test]
    fn bucket_keys_are_unique_and_sorted(
        points in prop::collection::vec(point_strategy(), 0..200),
        scale in scale_strategy(),
    ) {
        let buckets = aggregate(&points, scale);
        let keys: HashSet<&str> = buckets.iter().map(|bucket| bucket.key.as_str()).collect();
        prop_assert_eq!(keys.len(), buckets.len());
        prop_assert!(buckets.windows(2).all(|pair| pair[0].bucket_start < pair[1].bucket_start));
    }

    #[test]
    fn zoom_in_then_out_round_trips(index in 1usize..TimeScale::ALL.len() - 1) {
        let scale = TimeScale::ALL[index];
        let mut nav = NavigationController::with_clock(scale, Arc::new(FixedClock(now())));
        nav.zoom_in();
        nav.zoom_out();
        prop_assert_eq!(nav.scale(), scale);
    }

    #[test]
    fn pan_round_trips_for_fine_scales(
        index in 0usize..5,
        year in 1_000i32..2_000,
        month in 1u32..=12,
        day in 1u32..=28,
        hour in 0u32..24,
        steps in 1u32..20,
    ) {
        let scale = TimeScale::ALL[index];
        let center = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap();
        let mut nav = NavigationController::with_clock(scale, Arc::new(FixedClock(now())));
        nav.set_center_date(center);

        nav.pan_forward(steps);
        nav.pan_backward(steps);
        prop_assert_eq!(nav.center_date(), center);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rendered_rows_are_bounded_by_capacity_and_overscan(
        item_count in 1usize..50_000,
        offset_factor in 0.0f64..1.0,
        row_height in 20u32..200,
        viewport_height in 100u32..1_200,
        overscan in 0usize..6,
    ) {
        let config = VirtualListConfig {
            viewport_height_px: f64::from(viewport_height),
            estimated_row_height_px: f64::from(row_height),
            overscan,
        };
        let mut list = VirtualList::new(item_count, config).expect("list");
        list.scroll_to(list.total_height_px() * offset_factor);
        let first = list.viewport_window().expect("window").first_visible_index;

        let rendered = list.frame().rows().len();
        let capacity = list.viewport_capacity();
        let bound = item_count.min(capacity + 2 * overscan);
        prop_assert!(rendered <= bound);
        if first >= overscan && first + capacity + overscan <= item_count {
            prop_assert_eq!(rendered, bound);
        }
    }
}
