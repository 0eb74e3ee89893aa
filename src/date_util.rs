use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::{Error, Result};

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.map_or(NaiveDate::MAX, |d| d - Duration::days(1))
}

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

/// Fractional days from `a` to `b`, negative when `b` precedes `a`.
pub fn signed_days(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / MS_PER_DAY
}

/// Fractional days from `a` to `b`, floored at zero. Missing endpoints count as zero.
pub fn days_between(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => signed_days(a, b).max(0.0),
        _ => 0.0,
    }
}

/// Whole days from `a` to `b`, rounded half up, signed.
pub fn whole_days(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (signed_days(a, b) + 0.5).floor() as i64
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Calendar month key, `YYYY-MM`.
pub fn month_key(d: DateTime<Utc>) -> String {
    format!("{}-{:02}", d.year(), d.month())
}

/// Keys for the `n` calendar months ending with the month of `now`, oldest first.
pub fn last_n_months(now: DateTime<Utc>, n: usize) -> Vec<String> {
    let mut year = now.year();
    let mut month = now.month();
    let mut keys = Vec::with_capacity(n);
    for _ in 0..n {
        keys.push(format!("{year}-{month:02}"));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    keys.reverse();
    keys
}

/// Parse an evaluation instant: RFC 3339, or a bare `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::InvalidTimestamp(s.to_string()))
}
