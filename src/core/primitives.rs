use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Earliest supported calendar year.
pub const MIN_CALENDAR_YEAR: i32 = -10_000;
/// Years past the current year that remain navigable.
pub const FUTURE_YEAR_HEADROOM: i32 = 100;

const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Returns `year-01-01T00:00:00Z`, or `None` outside chrono's range.
#[must_use]
pub fn year_start(year: i32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Inclusive supported range `[MIN_CALENDAR_YEAR-01-01, (now.year + 100)-12-31T23:59:59]`.
#[must_use]
pub fn calendar_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let min = year_start(MIN_CALENDAR_YEAR).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let max = year_start(now.year().saturating_add(FUTURE_YEAR_HEADROOM + 1))
        .map(|next| next - TimeDelta::seconds(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (min, max)
}

#[must_use]
pub fn clamp_to_calendar(time: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let (min, max) = calendar_bounds(now);
    time.clamp(min, max)
}

#[must_use]
pub fn add_months(time: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        time.checked_add_months(magnitude)
    } else {
        time.checked_sub_months(magnitude)
    }
}

#[must_use]
pub fn add_delta(time: DateTime<Utc>, delta: TimeDelta) -> Option<DateTime<Utc>> {
    time.checked_add_signed(delta)
}

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Formats a timestamp in the wire form used by the query contract.
///
/// Years outside `0..=9999` carry an explicit sign, which `parse_timestamp`
/// accepts back.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(WIRE_TIMESTAMP_FORMAT).to_string()
}

/// Parses RFC 3339, the signed-year wire form, or a bare `YYYY-MM-DD` date.
#[must_use]
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(body) = input.strip_suffix('Z') {
        if let Ok(naive) = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Zero-padded year with a leading `-` for years before 0.
#[must_use]
pub fn format_year(year: i32) -> String {
    if year < 0 {
        format!("-{:04}", year.unsigned_abs())
    } else {
        format!("{year:04}")
    }
}
