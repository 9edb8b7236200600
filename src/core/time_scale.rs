use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::{add_delta, add_months, format_year, year_start};
use crate::error::TimelineError;

/// Zoom granularity, ordered from finest to coarsest.
///
/// The derived `Ord` is the zoom direction: `zoom_in` walks towards
/// `Hour`, `zoom_out` towards `Max`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    Decade,
    Century,
    Millennium,
    Max,
}

/// Half-window distance for one scale, expressed in the calendar unit the
/// arithmetic has to happen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSpan {
    Hours(i64),
    Days(i64),
    Weeks(i64),
    Months(i64),
    Years(i64),
}

impl ScaleSpan {
    /// Shifts `time` by `multiplier` spans; `None` when the result leaves
    /// chrono's representable range.
    #[must_use]
    pub fn shift(self, time: DateTime<Utc>, multiplier: i64) -> Option<DateTime<Utc>> {
        match self {
            Self::Hours(hours) => {
                add_delta(time, TimeDelta::try_hours(hours.checked_mul(multiplier)?)?)
            }
            Self::Days(days) => {
                add_delta(time, TimeDelta::try_days(days.checked_mul(multiplier)?)?)
            }
            Self::Weeks(weeks) => {
                add_delta(time, TimeDelta::try_weeks(weeks.checked_mul(multiplier)?)?)
            }
            Self::Months(months) => add_months(time, months.checked_mul(multiplier)?),
            Self::Years(years) => {
                add_months(time, years.checked_mul(12)?.checked_mul(multiplier)?)
            }
        }
    }
}

impl TimeScale {
    pub const ALL: [Self; 9] = [
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
        Self::Decade,
        Self::Century,
        Self::Millennium,
        Self::Max,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Decade => "decade",
            Self::Century => "century",
            Self::Millennium => "millennium",
            Self::Max => "max",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Hour => "Hour",
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
            Self::Decade => "Decade",
            Self::Century => "Century",
            Self::Millennium => "Millennium",
            Self::Max => "Max",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Next-finer scale, or `None` at `Hour`.
    #[must_use]
    pub fn finer(self) -> Option<Self> {
        self.index()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Next-coarser scale, or `None` at `Max`.
    #[must_use]
    pub fn coarser(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Scales from `Decade` upwards share the reset-to-now navigation policy.
    #[must_use]
    pub fn is_coarse(self) -> bool {
        self >= Self::Decade
    }

    /// Distance from the window center to either edge.
    ///
    /// `Max` has a fixed absolute window; its span only drives panning.
    #[must_use]
    pub fn half_span(self) -> ScaleSpan {
        match self {
            Self::Hour => ScaleSpan::Hours(24),
            Self::Day => ScaleSpan::Days(14),
            Self::Week => ScaleSpan::Weeks(8),
            Self::Month => ScaleSpan::Months(12),
            Self::Year => ScaleSpan::Years(5),
            Self::Decade => ScaleSpan::Years(50),
            Self::Century => ScaleSpan::Years(500),
            Self::Millennium => ScaleSpan::Years(5_000),
            Self::Max => ScaleSpan::Years(10_000),
        }
    }

    fn year_stride(self) -> Option<i32> {
        match self {
            Self::Decade => Some(10),
            Self::Century => Some(100),
            Self::Millennium | Self::Max => Some(1_000),
            _ => None,
        }
    }

    /// Truncates `time` to the start of its bucket at this scale.
    ///
    /// Weeks start on Sunday. Multi-year strides use Euclidean division so
    /// that negative years floor instead of rounding towards zero.
    #[must_use]
    pub fn bucket_start(self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let date = time.date_naive();
        match self {
            Self::Hour => date.and_hms_opt(time.hour(), 0, 0).map(|naive| naive.and_utc()),
            Self::Day => date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()),
            Self::Week => {
                let back = i64::from(date.weekday().num_days_from_sunday());
                date.checked_sub_signed(TimeDelta::try_days(back)?)
                    .and_then(|sunday| sunday.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                .and_then(|first| first.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc()),
            Self::Year => year_start(date.year()),
            Self::Decade | Self::Century | Self::Millennium | Self::Max => {
                let stride = self.year_stride()?;
                year_start(date.year().div_euclid(stride) * stride)
            }
        }
    }

    /// Start of the bucket following the one beginning at `bucket_start`.
    #[must_use]
    pub fn next_bucket_start(self, bucket_start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Hour => add_delta(bucket_start, TimeDelta::try_hours(1)?),
            Self::Day => add_delta(bucket_start, TimeDelta::try_days(1)?),
            Self::Week => add_delta(bucket_start, TimeDelta::try_weeks(1)?),
            Self::Month => add_months(bucket_start, 1),
            Self::Year => year_start(bucket_start.year().checked_add(1)?),
            Self::Decade | Self::Century | Self::Millennium | Self::Max => {
                year_start(bucket_start.year().checked_add(self.year_stride()?)?)
            }
        }
    }

    /// Stable key for a bucket start; unique per scale.
    #[must_use]
    pub fn bucket_key(self, bucket_start: DateTime<Utc>) -> String {
        let year = format_year(bucket_start.year());
        match self {
            Self::Hour => format!(
                "{year}-{:02}-{:02}-{:02}",
                bucket_start.month(),
                bucket_start.day(),
                bucket_start.hour()
            ),
            Self::Day | Self::Week => {
                format!("{year}-{:02}-{:02}", bucket_start.month(), bucket_start.day())
            }
            Self::Month => format!("{year}-{:02}", bucket_start.month()),
            Self::Year => year,
            Self::Decade | Self::Century | Self::Millennium | Self::Max => {
                format!("{}s", bucket_start.year())
            }
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeScale {
    type Err = TimelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|scale| scale.as_str() == normalized)
            .ok_or_else(|| TimelineError::UnknownTimeScale(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::TimeScale;
    use chrono::{TimeZone, Utc};

    #[test]
    fn zoom_neighbours_stop_at_the_ends() {
        assert_eq!(TimeScale::Hour.finer(), None);
        assert_eq!(TimeScale::Max.coarser(), None);
        assert_eq!(TimeScale::Day.finer(), Some(TimeScale::Hour));
        assert_eq!(TimeScale::Millennium.coarser(), Some(TimeScale::Max));
    }

    #[test]
    fn week_buckets_start_on_sunday() {
        // 2024-01-10 is a Wednesday.
        let time = Utc.with_ymd_and_hms(2024, 1, 10, 15, 30, 0).unwrap();
        let start = TimeScale::Week.bucket_start(time).expect("start");
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap());
        assert_eq!(TimeScale::Week.bucket_key(start), "2024-01-07");
    }

    #[test]
    fn negative_years_floor_to_their_stride() {
        let time = Utc.with_ymd_and_hms(-1234, 6, 1, 0, 0, 0).unwrap();
        let start = TimeScale::Millennium.bucket_start(time).expect("start");
        assert_eq!(TimeScale::Millennium.bucket_key(start), "-2000s");

        let start = TimeScale::Decade.bucket_start(time).expect("start");
        assert_eq!(TimeScale::Decade.bucket_key(start), "-1240s");
    }

    #[test]
    fn next_bucket_start_advances_one_resolution_step() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            TimeScale::Month.next_bucket_start(start),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
        let century = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            TimeScale::Century.next_bucket_start(century),
            Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_scale_names_case_insensitively() {
        assert_eq!("Month".parse::<TimeScale>(), Ok(TimeScale::Month));
        assert!("fortnight".parse::<TimeScale>().is_err());
    }
}
