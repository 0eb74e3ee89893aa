use std::borrow::Borrow;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::date_util::{last_n_months, month_key};
use crate::task::Task;

use super::{avg, borrowed, efficiency_score, group, quality, reopen_rate, timeliness};
use super::{EfficiencyTrend, GroupField};

/// Series key for the organization-wide trend.
pub const ORGANIZATION_KEY: &str = "Organization";

/// Balance component used for a single key's monthly bucket, where there is no
/// spread across assignees to measure.
const SINGLE_BUCKET_BALANCE: f64 = 100.0;

/// Monthly efficiency for the most populous keys of `field`, as of the current
/// wall-clock time.
pub fn compute_efficiency_trend<T: Borrow<Task>>(
    tasks: &[T],
    field: GroupField,
    months_back: usize,
    top_k: usize,
) -> EfficiencyTrend {
    compute_efficiency_trend_at(tasks, field, months_back, top_k, Utc::now())
}

/// Monthly efficiency for the `top_k` keys of `field` with the most tasks,
/// over the `months_back` calendar months ending with the month of `now`.
///
/// Key popularity counts every task of the key, completed or not; ties keep
/// first-seen order. Each cell scores the key's tasks completed in that month.
pub fn compute_efficiency_trend_at<T: Borrow<Task>>(
    tasks: &[T],
    field: GroupField,
    months_back: usize,
    top_k: usize,
    now: DateTime<Utc>,
) -> EfficiencyTrend {
    let months = last_n_months(now, months_back);
    let groups = group(tasks, field);

    let mut ranked: Vec<(&String, &Vec<&Task>)> = groups.iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    let keys: Vec<String> = ranked
        .into_iter()
        .take(top_k)
        .map(|(key, _)| key.clone())
        .collect();

    let mut series = IndexMap::new();
    for month in &months {
        let mut row = IndexMap::new();
        for key in &keys {
            let in_month = completed_in_month(&groups[key.as_str()], month);
            row.insert(key.clone(), monthly_efficiency(&in_month));
        }
        series.insert(month.clone(), row);
    }

    log::debug!(
        "Efficiency trend by {field}: {} months, keys {:?}",
        months.len(),
        keys
    );
    EfficiencyTrend {
        months,
        keys,
        series,
    }
}

/// Monthly efficiency over every task, under the single key [`ORGANIZATION_KEY`].
pub fn compute_org_efficiency_at<T: Borrow<Task>>(
    tasks: &[T],
    months_back: usize,
    now: DateTime<Utc>,
) -> EfficiencyTrend {
    let tasks = borrowed(tasks);
    let months = last_n_months(now, months_back);

    let series = months
        .iter()
        .map(|month| {
            let in_month = completed_in_month(&tasks, month);
            let mut row = IndexMap::new();
            row.insert(ORGANIZATION_KEY.to_string(), monthly_efficiency(&in_month));
            (month.clone(), row)
        })
        .collect();

    EfficiencyTrend {
        months,
        keys: vec![ORGANIZATION_KEY.to_string()],
        series,
    }
}

fn completed_in_month<'a>(tasks: &[&'a Task], month: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .copied()
        .filter(|t| t.completed_at.is_some_and(|c| month_key(c) == month))
        .collect()
}

/// Efficiency of tasks completed within one month for one key.
fn monthly_efficiency(completed: &[&Task]) -> f64 {
    let changes: Vec<f64> = completed.iter().map(|t| f64::from(t.changes_count)).collect();
    efficiency_score(
        timeliness(completed),
        quality(reopen_rate(completed, completed.len()), avg(&changes)),
        SINGLE_BUCKET_BALANCE,
    )
}
