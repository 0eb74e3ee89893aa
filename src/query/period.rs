use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{last_day_of_month, quarter_of};
use crate::error::{Error, Result};

static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static RE_ROLLING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)[dD]$").unwrap());

/// A reporting window for filtering tasks.
///
/// Rolling and to-date periods are anchored on an `as_of` date supplied when
/// the range is resolved, so the same period can be evaluated against a fixed
/// instant in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Quarter(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    Rolling(u32),
    YearToDate,
    QuarterToDate,
    MonthToDate,
}

impl Period {
    /// Parse a period string.
    ///
    /// Supported formats:
    /// - `2025`: year
    /// - `2025-Q1`: quarter
    /// - `2025-01`: month
    /// - `2025-W05`: ISO week
    /// - `30d`: rolling last N days
    /// - `ytd`: year to date
    /// - `qtd` (or `quarter`): quarter to date
    /// - `mtd`: month to date
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "ytd" => return Ok(Period::YearToDate),
            "qtd" | "quarter" => return Ok(Period::QuarterToDate),
            "mtd" => return Ok(Period::MonthToDate),
            _ => {}
        }

        if let Some(caps) = RE_ROLLING.captures(s) {
            let days: u32 = parse_num(&caps[1], s)?;
            if days == 0 {
                return Err(Error::PeriodParse(format!("empty rolling window: {s}")));
            }
            return Ok(Period::Rolling(days));
        }

        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            return Ok(Period::Quarter(parse_num(&caps[1], s)?, parse_num(&caps[2], s)?));
        }

        if let Some(caps) = RE_WEEK.captures(s) {
            let week: u8 = parse_num(&caps[2], s)?;
            if (1..=53).contains(&week) {
                return Ok(Period::Week(parse_num(&caps[1], s)?, week));
            }
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let month: u8 = parse_num(&caps[2], s)?;
            if (1..=12).contains(&month) {
                return Ok(Period::Month(parse_num(&caps[1], s)?, month));
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    /// Canonical key string.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n) => format!("{n}d"),
            Period::YearToDate => "ytd".to_string(),
            Period::QuarterToDate => "qtd".to_string(),
            Period::MonthToDate => "mtd".to_string(),
        }
    }

    /// Inclusive date range of this period as seen on `as_of`.
    pub fn date_range(&self, as_of: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let range = match self {
            Period::Year(y) => (ymd(*y, 1, 1)?, ymd(*y, 12, 31)?),
            Period::Quarter(y, q) => {
                if !(1..=4).contains(q) {
                    return Err(Error::PeriodParse(format!("invalid quarter: {q}")));
                }
                let start_month = (*q as u32 - 1) * 3 + 1;
                (ymd(*y, start_month, 1)?, last_day_of_month(*y, *q as u32 * 3))
            }
            Period::Month(y, m) => (ymd(*y, *m as u32, 1)?, last_day_of_month(*y, *m as u32)),
            Period::Week(y, w) => {
                let start = NaiveDate::from_isoywd_opt(*y, *w as u32, Weekday::Mon)
                    .ok_or_else(|| Error::PeriodParse(format!("invalid week: {y}-W{w:02}")))?;
                (start, start + Duration::days(6))
            }
            Period::Rolling(n) => {
                let start = as_of
                    .checked_sub_signed(Duration::days(i64::from(n.saturating_sub(1))))
                    .ok_or_else(|| Error::PeriodParse(format!("rolling window too large: {n}d")))?;
                (start, as_of)
            }
            Period::YearToDate => (ymd(as_of.year(), 1, 1)?, as_of),
            Period::QuarterToDate => {
                let start_month = (quarter_of(as_of) as u32 - 1) * 3 + 1;
                (ymd(as_of.year(), start_month, 1)?, as_of)
            }
            Period::MonthToDate => (ymd(as_of.year(), as_of.month(), 1)?, as_of),
        };
        Ok(range)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::PeriodParse(format!("invalid date: {year}-{month:02}-{day:02}")))
}

fn parse_num<N: std::str::FromStr>(digits: &str, input: &str) -> Result<N> {
    digits
        .parse()
        .map_err(|_| Error::PeriodParse(format!("number out of range in: {input}")))
}
