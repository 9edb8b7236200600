use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use moment_timeline::api::{VirtualList, VirtualListConfig};
use moment_timeline::core::{RawMomentPoint, TimeScale, aggregate};
use std::hint::black_box;

fn bench_aggregate_100k_points(c: &mut Criterion) {
    let origin = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    let points: Vec<RawMomentPoint> = (0..100_000i64)
        .map(|i| {
            RawMomentPoint::new(origin + TimeDelta::minutes(i * 37), format!("m-{i}"))
                .starred(i % 7 == 0)
                .with_weight((i % 5) as u32 + 1)
        })
        .collect();

    for scale in [TimeScale::Day, TimeScale::Month, TimeScale::Decade] {
        c.bench_function(&format!("aggregate_100k_{scale}"), |b| {
            b.iter(|| {
                let buckets = aggregate(black_box(&points), black_box(scale));
                black_box(buckets.len());
            })
        });
    }
}

fn bench_virtual_list_1m_rows(c: &mut Criterion) {
    let mut list =
        VirtualList::new(1_000_000, VirtualListConfig::default()).expect("valid list config");
    let mut index = 0usize;

    c.bench_function("virtual_list_scroll_1m", |b| {
        b.iter(|| {
            index = (index + 7_919) % 1_000_000;
            list.scroll_to_index(black_box(index));
            let frame = list.frame();
            black_box(frame.rows().len());
        })
    });

    c.bench_function("virtual_list_measure_1m", |b| {
        b.iter(|| {
            index = (index + 104_729) % 1_000_000;
            list.measure(black_box(index), 80.0 + (index % 40) as f64)
                .expect("measure");
        })
    });
}

criterion_group!(benches, bench_aggregate_100k_points, bench_virtual_list_1m_rows);
criterion_main!(benches);
