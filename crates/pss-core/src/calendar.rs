//! Calendar utilities -- integer date encoding and absolute-instant arithmetic.
//!
//! Dates travel through the system as `YYYYMMDD` integers (e.g. `20200414`) and
//! times of day as fractional hours (`19.25` is 19:15). All interval comparisons
//! happen on [`NaiveDateTime`] instants built from a date plus an hour offset, so
//! two tasks that describe the same instant compare equal however the instant
//! was split between the date and start-time fields.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, ScheduleError};

/// Upper bound (inclusive) for both start times and durations, in hours.
pub const MAX_HOURS: f64 = 23.75;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Encode a calendar date as a `YYYYMMDD` integer.
pub fn date_to_int(date: NaiveDate) -> u32 {
    // Years before 0 never come out of `int_to_date`.
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Decode a `YYYYMMDD` integer into a calendar date.
///
/// # Errors
/// Returns `ScheduleError::Validation` for combinations that do not exist on the
/// calendar (`20200230`, `20201301`, `20200400`). Nothing is clamped: the decoded
/// date must re-encode to exactly `value`.
pub fn int_to_date(value: u32) -> Result<NaiveDate> {
    let year = (value / 10_000) as i32;
    let month = (value / 100) % 100;
    let day = value % 100;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ScheduleError::Validation(format!("bad date {}", value)))?;
    if date_to_int(date) != value {
        return Err(ScheduleError::Validation(format!("bad date {}", value)));
    }
    Ok(date)
}

/// Render a `YYYYMMDD` integer as `YYYY-MM-DD`.
pub fn date_to_string(value: u32) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value / 10_000,
        (value / 100) % 100,
        value % 100
    )
}

/// Check that a start time or duration lies in `[0, MAX_HOURS]`.
pub fn validate_hours(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || !(0.0..=MAX_HOURS).contains(&value) {
        return Err(ScheduleError::Validation(format!(
            "bad {}: {} (must be between 0 and {})",
            field, value, MAX_HOURS
        )));
    }
    Ok(())
}

/// Render fractional hours as `H:MM` (`19.25` is `19:15`).
pub fn format_hours(hours: f64) -> String {
    let minutes = (hours * 60.0).round() as i64;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Round an hour value to the nearest quarter hour.
///
/// Ties round away from zero, so `0.125` becomes `0.25` and `0.375` becomes `0.5`.
pub fn round_to_quarter(hours: f64) -> f64 {
    (hours / 0.25).round() * 0.25
}

/// The absolute instant `hours` after midnight of `date`.
///
/// Offsets are resolved to the millisecond, which is exact for every quarter hour.
pub fn instant(date: NaiveDate, hours: f64) -> Result<NaiveDateTime> {
    let millis = (hours * MILLIS_PER_HOUR).round() as i64;
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::milliseconds(millis))
        .ok_or_else(|| {
            ScheduleError::DateRange(format!("{} + {}h", date.format("%Y-%m-%d"), hours))
        })
}

/// Signed distance from `from` to `to` in fractional hours.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// `date` shifted by `days` (may be negative).
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days)).ok_or_else(|| {
        ScheduleError::DateRange(format!("{} + {} days", date.format("%Y-%m-%d"), days))
    })
}

/// ISO-8601 week number (1..=53) of `date`.
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}
