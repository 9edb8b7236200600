use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use crate::core::{RawMomentPoint, TimeBucket, TimeScale};

/// Buckets plus the data-quality counters gathered while building them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregationReport {
    pub buckets: Vec<TimeBucket>,
    pub accepted_points: usize,
    /// Points skipped because their timestamp did not parse or could not be bucketed.
    pub dropped_points: usize,
}

struct BucketAccumulator {
    bucket: TimeBucket,
    representative_time: Option<DateTime<Utc>>,
}

impl BucketAccumulator {
    fn new(key: String, bucket_start: DateTime<Utc>) -> Self {
        Self {
            bucket: TimeBucket {
                key,
                bucket_start,
                count: 0,
                star_count: 0,
                total_weight: 0,
                representative_item: None,
            },
            representative_time: None,
        }
    }

    fn push(&mut self, point: &RawMomentPoint, time: DateTime<Utc>) {
        self.bucket.count += 1;
        if point.is_starred {
            self.bucket.star_count += 1;
        }
        self.bucket.total_weight += u64::from(point.effective_weight());

        if self.should_replace_representative(point, time) {
            self.bucket.representative_item = Some(point.clone());
            self.representative_time = Some(time);
        }
    }

    // Greatest weight wins, then earliest timestamp, then first seen.
    fn should_replace_representative(
        &self,
        candidate: &RawMomentPoint,
        time: DateTime<Utc>,
    ) -> bool {
        let (Some(current), Some(current_time)) =
            (&self.bucket.representative_item, self.representative_time)
        else {
            return true;
        };

        match candidate.effective_weight().cmp(&current.effective_weight()) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => time < current_time,
        }
    }
}

/// Groups raw points into sparse buckets at `scale`, sorted by bucket start.
#[must_use]
pub fn aggregate(points: &[RawMomentPoint], scale: TimeScale) -> Vec<TimeBucket> {
    aggregate_with_report(points, scale).buckets
}

/// Same as [`aggregate`] but also reports how many points were dropped.
#[must_use]
pub fn aggregate_with_report(points: &[RawMomentPoint], scale: TimeScale) -> AggregationReport {
    let mut groups: IndexMap<String, BucketAccumulator> = IndexMap::new();
    let mut dropped_points = 0usize;

    for point in points {
        let Some((time, bucket_start)) = point
            .parsed_timestamp()
            .and_then(|time| scale.bucket_start(time).map(|start| (time, start)))
        else {
            dropped_points += 1;
            continue;
        };

        let key = scale.bucket_key(bucket_start);
        groups
            .entry(key.clone())
            .or_insert_with(|| BucketAccumulator::new(key, bucket_start))
            .push(point, time);
    }

    if dropped_points > 0 {
        debug!(
            dropped_points,
            scale = %scale,
            "skipped points with invalid timestamps"
        );
    }

    groups.sort_by(|_, a, _, b| a.bucket.bucket_start.cmp(&b.bucket.bucket_start));
    let buckets: Vec<TimeBucket> = groups.into_values().map(|acc| acc.bucket).collect();
    AggregationReport {
        accepted_points: points.len() - dropped_points,
        dropped_points,
        buckets,
    }
}

/// Normalizes buckets that arrived pre-aggregated from the query layer.
///
/// Empty buckets are dropped, `star_count` is capped at `count`, buckets
/// sharing a key are merged, and the result is sorted by bucket start.
#[must_use]
pub fn normalize_buckets(buckets: Vec<TimeBucket>) -> Vec<TimeBucket> {
    let mut merged: IndexMap<String, TimeBucket> = IndexMap::with_capacity(buckets.len());

    for mut bucket in buckets {
        if bucket.count == 0 {
            continue;
        }
        bucket.star_count = bucket.star_count.min(bucket.count);

        match merged.entry(bucket.key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(bucket);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.count += bucket.count;
                existing.star_count += bucket.star_count;
                existing.total_weight += bucket.total_weight;
                existing.bucket_start = existing.bucket_start.min(bucket.bucket_start);
                if existing.representative_item.is_none() {
                    existing.representative_item = bucket.representative_item;
                }
            }
        }
    }

    merged.sort_by(|_, a, _, b| a.bucket_start.cmp(&b.bucket_start));
    merged.into_values().collect()
}
