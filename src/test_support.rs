use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::task::Task;

/// Fixed evaluation instant for deterministic tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// An instant `days` before [`now`], fractional days allowed.
pub fn days_ago(days: f64) -> DateTime<Utc> {
    now() - Duration::milliseconds((days * 86_400_000.0) as i64)
}

/// Midnight UTC on the given day of March 2025.
pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap()
}

pub fn task(id: &str, created_at: DateTime<Utc>) -> Task {
    Task::new(id, format!("Task {id}"), created_at)
}
