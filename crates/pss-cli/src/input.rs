//! Parsing of the values typed at menu prompts.

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use pss_core::calendar::date_to_int;

/// `YYYY-MM-DD` to a `YYYYMMDD` integer.
pub fn parse_date(text: &str) -> Result<u32> {
    let Ok(date) = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") else {
        bail!("bad date entered");
    };
    // Dates outside 0000-9999 have no `YYYYMMDD` form.
    if !(0..=9999).contains(&date.year()) {
        bail!("bad date entered");
    }
    Ok(date_to_int(date))
}

/// `H:MM` or `HH:MM` to fractional hours.
pub fn parse_time(text: &str) -> Result<f64> {
    let Ok(time) = NaiveTime::parse_from_str(text.trim(), "%H:%M") else {
        bail!("bad start time entered");
    };
    Ok(time.hour() as f64 + time.minute() as f64 / 60.0)
}

/// Decimal hours, e.g. `8.5` for eight and a half hours.
pub fn parse_hours(text: &str) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(hours) if hours.is_finite() => Ok(hours),
        _ => bail!("bad duration entered"),
    }
}

/// A whole number, named `what` in the error.
pub fn parse_number(text: &str, what: &str) -> Result<u32> {
    text.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("bad {} entered", what))
}
