use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::core::TimeScale;
use crate::core::primitives::format_year;

/// Human-facing label for the bucket starting at `bucket_start`.
#[must_use]
pub fn bucket_label(scale: TimeScale, bucket_start: DateTime<Utc>) -> String {
    match scale {
        TimeScale::Hour => format!(
            "{} {:02}:00",
            day_label(bucket_start),
            bucket_start.hour()
        ),
        TimeScale::Day => day_label(bucket_start),
        TimeScale::Week => format!("Week of {}", day_label(bucket_start)),
        TimeScale::Month => format!(
            "{} {}",
            bucket_start.format("%B"),
            format_year(bucket_start.year())
        ),
        TimeScale::Year => format_year(bucket_start.year()),
        TimeScale::Decade | TimeScale::Century | TimeScale::Millennium | TimeScale::Max => {
            scale.bucket_key(bucket_start)
        }
    }
}

/// Compact count label: `999`, `1.5K`, `2.3M`.
///
/// Units are picked after rounding to one decimal, so `999_950` is `1.0M`.
#[must_use]
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let value = count as f64;
    let tenths_of_thousands = (value / 100.0).round();
    if tenths_of_thousands >= 10_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else {
        format!("{:.1}K", value / 1_000.0)
    }
}

#[must_use]
pub fn scale_indicator(scale: TimeScale) -> String {
    format!("Scale: {}", scale.display_name())
}

fn day_label(time: DateTime<Utc>) -> String {
    format!(
        "{} {:02}, {}",
        time.format("%b"),
        time.day(),
        format_year(time.year())
    )
}
