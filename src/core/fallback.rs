use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{RawMomentPoint, TimeBucket, TimeScale, TimeWindow};

/// Upper bound on synthetic buckets produced for one window.
pub const MAX_FALLBACK_BUCKETS: usize = 64;

const STARRED_BUCKET_PROBABILITY: f64 = 0.3;

/// Derives a per-request seed so distinct windows get distinct synthetic data
/// while the same window always gets the same data.
#[must_use]
pub fn fallback_seed(base_seed: u64, window: TimeWindow, scale: TimeScale) -> u64 {
    let start = window.start().timestamp() as u64;
    let end = window.end().timestamp() as u64;
    base_seed
        ^ start.rotate_left(17)
        ^ end.rotate_left(41)
        ^ (scale.index() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Generates deterministic placeholder buckets covering `window` at `scale`
/// resolution.
///
/// Used when the query layer fails so the view never goes blank. Buckets are
/// aligned exactly like real aggregates, with `1..=100` moments each.
#[must_use]
pub fn fallback_buckets(window: TimeWindow, scale: TimeScale, seed: u64) -> Vec<TimeBucket> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut buckets = Vec::new();
    let mut cursor = scale.bucket_start(window.start());

    while let Some(bucket_start) = cursor {
        if bucket_start > window.end() || buckets.len() >= MAX_FALLBACK_BUCKETS {
            break;
        }

        let count: u64 = rng.gen_range(1..=100);
        let star_count = if rng.gen_bool(STARRED_BUCKET_PROBABILITY) {
            rng.gen_range(1..=count.min(5))
        } else {
            0
        };
        let ordinal = buckets.len();
        let representative = RawMomentPoint::new(bucket_start, format!("fallback-{ordinal}"))
            .starred(star_count > 0)
            .with_weight(u32::try_from(count).unwrap_or(u32::MAX));

        buckets.push(TimeBucket {
            key: scale.bucket_key(bucket_start),
            bucket_start,
            count,
            star_count,
            total_weight: count,
            representative_item: Some(representative),
        });
        cursor = scale.next_bucket_start(bucket_start);
    }

    buckets
}
