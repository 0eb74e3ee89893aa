pub mod dependency;
pub mod distribution;
pub mod grouping;
pub mod health;
pub mod risk;
pub mod trend;
pub mod types;

pub use dependency::top_blockers;
pub use distribution::compute_flow_distribution;
pub use grouping::{group, GroupField, UNDEFINED_KEY};
pub use health::{GroupHealth, Health};
pub use risk::{compute_task_risk, compute_task_risk_at, RiskFactor};
pub use trend::{
    compute_efficiency_trend, compute_efficiency_trend_at, compute_org_efficiency_at,
    ORGANIZATION_KEY,
};
pub use types::*;

use std::borrow::Borrow;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use crate::date_util::{days_between, round_to};
use crate::task::{Status, Task};

/// Open tasks older than this many days count as aging.
pub const AGING_THRESHOLD_DAYS: f64 = 7.0;

/// Number of weekly bins in a group's throughput trend.
pub const TREND_WEEKS: i64 = 4;

pub const WITHOUT_FOLLOW_UP: &str = "Without follow-up";
pub const WITH_FOLLOW_UP: &str = "With follow-up";
pub const NOT_COMPLETED: &str = "Not completed";

const TIMELINESS_WEIGHT: f64 = 0.5;
const QUALITY_WEIGHT: f64 = 0.3;
const BALANCE_WEIGHT: f64 = 0.2;

/// Compute metrics for a group of tasks as of the current wall-clock time.
///
/// Aging and the weekly trend depend on the evaluation instant; use
/// [`compute_group_metrics_at`] for reproducible results.
pub fn compute_group_metrics<T: Borrow<Task>>(name: &str, tasks: &[T]) -> GroupMetrics {
    compute_group_metrics_at(name, tasks, Utc::now())
}

/// Compute metrics for a group of tasks as of `now`.
///
/// An empty group yields zeroed indicators, three empty completion buckets and
/// four empty trend bins. The efficiency score of an empty group is 50: no
/// timeliness, but nothing reopened and nothing unbalanced either.
pub fn compute_group_metrics_at<T: Borrow<Task>>(
    name: &str,
    tasks: &[T],
    now: DateTime<Utc>,
) -> GroupMetrics {
    let tasks = borrowed(tasks);

    let inverted = tasks.iter().filter(|t| t.has_inverted_timestamps()).count();
    if inverted > 0 {
        log::debug!("{name}: {inverted} tasks with out-of-order timestamps, treated as zero duration");
    }

    let lead_times: Vec<f64> = tasks.iter().map(|t| pickup_days(t)).collect();
    let cycle_times: Vec<f64> = tasks
        .iter()
        .map(|t| days_between(t.started_at, t.completed_at))
        .collect();

    let wip = tasks.iter().filter(|t| t.status.is_active()).count() as u64;
    let aging_count = tasks
        .iter()
        .filter(|t| {
            t.status != Status::Done
                && days_between(Some(t.age_anchor()), Some(now)) > AGING_THRESHOLD_DAYS
        })
        .count() as u64;

    let lead_time = avg(&lead_times);
    let wait_to_work = lead_time / avg(&cycle_times).max(1.0);

    let completed: Vec<&Task> = tasks.iter().copied().filter(|t| t.is_completed()).collect();
    let throughput = completed.len() as u64;
    let overdue_days: Vec<f64> = completed
        .iter()
        .map(|t| f64::from(t.overdue_days.unwrap_or(0)))
        .collect();
    let overdue_severity = avg(&overdue_days);
    let reopen_rate = reopen_rate(&tasks, completed.len());
    let changes: Vec<f64> = tasks.iter().map(|t| f64::from(t.changes_count)).collect();
    let change_frequency = avg(&changes);
    let load_balancing_index = load_balancing_index(&tasks);

    let efficiency_score = efficiency_score(
        timeliness(&completed),
        quality(reopen_rate, change_frequency),
        balance(load_balancing_index),
    );

    let risk = wip as f64 * 2.0
        + aging_count as f64 * 3.0
        + overdue_severity * 6.0
        + (wait_to_work - 1.0).max(0.0) * 15.0;

    let metrics = GroupMetrics {
        name: name.to_string(),
        lead_time_days: round_to(lead_time, 1),
        cycle_time_days: round_to(avg(&cycle_times), 1),
        wip,
        aging_count,
        handover_delay_days: round_to(lead_time, 1),
        wait_to_work_ratio: round_to(wait_to_work, 2),
        risk_score: round_to(risk.clamp(0.0, 100.0), 1),
        throughput,
        overdue_severity_days: round_to(overdue_severity, 1),
        reopen_rate_pct: round_to(reopen_rate.min(100.0), 1),
        change_frequency,
        load_balancing_index,
        efficiency_score,
        completion_types: completion_types(&tasks),
        trend: throughput_trend(&completed, now),
    };

    log::debug!(
        "{name}: {} tasks, wip={}, throughput={}, risk={}, efficiency={}",
        tasks.len(),
        metrics.wip,
        metrics.throughput,
        metrics.risk_score,
        metrics.efficiency_score
    );
    metrics
}

/// Split tasks into completed without follow-up, completed with follow-up,
/// and not completed. Counts always sum to the number of tasks.
pub fn completion_types<T: Borrow<Task>>(tasks: &[T]) -> Vec<CompletionType> {
    let tasks = borrowed(tasks);
    let (with_follow_up, without_follow_up): (Vec<&Task>, Vec<&Task>) = tasks
        .iter()
        .copied()
        .filter(|t| t.is_completed())
        .partition(|t| t.follow_ups > 0);
    let not_completed = tasks.len() - with_follow_up.len() - without_follow_up.len();

    vec![
        CompletionType {
            label: WITHOUT_FOLLOW_UP,
            count: without_follow_up.len() as u64,
        },
        CompletionType {
            label: WITH_FOLLOW_UP,
            count: with_follow_up.len() as u64,
        },
        CompletionType {
            label: NOT_COMPLETED,
            count: not_completed as u64,
        },
    ]
}

// ── Shared helpers ─────────────────────────────────────────────────

pub(crate) fn borrowed<T: Borrow<Task>>(tasks: &[T]) -> Vec<&Task> {
    tasks.iter().map(<T as Borrow<Task>>::borrow).collect()
}

/// Days from creation to start, zero when not started or out of order.
pub(crate) fn pickup_days(task: &Task) -> f64 {
    days_between(Some(task.created_at), task.started_at)
}

/// Mean rounded to two decimals, zero for no values.
pub(crate) fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round_to(values.iter().sum::<f64>() / values.len() as f64, 2)
}

/// Population standard deviation rounded to two decimals.
fn stddev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let mean = avg(values);
    let squared: Vec<f64> = values.iter().map(|v| (v - mean).powi(2)).collect();
    round_to(avg(&squared).sqrt(), 2)
}

/// Reopened tasks per completed task, as a percentage. Not capped.
pub(crate) fn reopen_rate(tasks: &[&Task], completed: usize) -> f64 {
    let reopened = tasks.iter().filter(|t| t.reopened).count();
    reopened as f64 / completed.max(1) as f64 * 100.0
}

/// Spread of task counts across assignees.
fn load_balancing_index(tasks: &[&Task]) -> f64 {
    let mut per_assignee: IndexMap<&str, u64> = IndexMap::new();
    for task in tasks {
        *per_assignee.entry(task.assignee.as_str()).or_default() += 1;
    }
    let counts: Vec<f64> = per_assignee.values().map(|&c| c as f64).collect();
    stddev(&counts)
}

/// Share of completed tasks finished on time, 0-100.
pub(crate) fn timeliness(completed: &[&Task]) -> f64 {
    let on_time = completed.iter().filter(|t| t.is_on_time()).count();
    on_time as f64 / completed.len().max(1) as f64 * 100.0
}

pub(crate) fn quality(reopen_rate: f64, change_frequency: f64) -> f64 {
    100.0 - (reopen_rate + change_frequency * 10.0).min(100.0)
}

fn balance(load_balancing_index: f64) -> f64 {
    100.0 - (load_balancing_index * 10.0).min(100.0)
}

/// Weighted composite of the three 0-100 components, clamped and rounded.
pub(crate) fn efficiency_score(timeliness: f64, quality: f64, balance: f64) -> f64 {
    let score = timeliness * TIMELINESS_WEIGHT + quality * QUALITY_WEIGHT + balance * BALANCE_WEIGHT;
    round_to(score.clamp(0.0, 100.0), 1)
}

/// Completed-task counts in weekly bins ending at `now`, oldest first.
fn throughput_trend(completed: &[&Task], now: DateTime<Utc>) -> Vec<TrendPoint> {
    (0..TREND_WEEKS)
        .rev()
        .map(|i| {
            let start = now - Duration::weeks(i + 1);
            let end = now - Duration::weeks(i);
            let count = completed
                .iter()
                .filter(|t| t.completed_at.is_some_and(|c| c >= start && c < end))
                .count();
            TrendPoint {
                period: end.format("%Y-%m-%d").to_string(),
                throughput: count as u64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{days_ago, now, task};

    fn apollo() -> Vec<Task> {
        let mut blocked = task("T-1", days_ago(10.0));
        blocked.project = "Apollo".into();
        blocked.status = Status::Blocked;
        blocked.started_at = Some(days_ago(9.0));
        blocked.due_date = Some(days_ago(5.0));

        let mut done = task("T-2", days_ago(20.0));
        done.project = "Apollo".into();
        done.status = Status::Done;
        done.started_at = Some(days_ago(18.0));
        done.completed_at = Some(days_ago(3.0));

        let mut fresh = task("T-3", days_ago(2.0));
        fresh.project = "Apollo".into();

        vec![blocked, done, fresh]
    }

    fn mixed() -> Vec<Task> {
        let mut a = task("A", days_ago(10.0));
        a.assignee = "Aarav".into();
        a.status = Status::Done;
        a.started_at = Some(days_ago(6.0));
        a.completed_at = Some(days_ago(2.0));
        a.overdue_days = Some(3);
        a.reopened = true;
        a.changes_count = 2;
        a.follow_ups = 1;

        let mut b = task("B", days_ago(8.0));
        b.assignee = "Aarav".into();
        b.status = Status::Done;
        b.started_at = Some(days_ago(7.0));
        b.completed_at = Some(days_ago(5.0));
        b.overdue_days = Some(0);
        b.changes_count = 1;

        let mut c = task("C", days_ago(4.0));
        c.assignee = "Diya".into();
        c.status = Status::InProgress;
        c.started_at = Some(days_ago(1.0));

        let mut d = task("D", days_ago(12.0));
        d.assignee = "Diya".into();
        d.changes_count = 1;

        let mut e = task("E", days_ago(1.0));
        e.assignee = "Kabir".into();

        vec![a, b, c, d, e]
    }

    #[test]
    fn test_empty_group_defaults() {
        let tasks: Vec<Task> = Vec::new();
        let m = compute_group_metrics_at("Empty", &tasks, now());

        assert_eq!(m.name, "Empty");
        assert_eq!(m.lead_time_days, 0.0);
        assert_eq!(m.cycle_time_days, 0.0);
        assert_eq!(m.wip, 0);
        assert_eq!(m.aging_count, 0);
        assert_eq!(m.handover_delay_days, 0.0);
        assert_eq!(m.wait_to_work_ratio, 0.0);
        assert_eq!(m.risk_score, 0.0);
        assert_eq!(m.throughput, 0);
        assert_eq!(m.overdue_severity_days, 0.0);
        assert_eq!(m.reopen_rate_pct, 0.0);
        assert_eq!(m.change_frequency, 0.0);
        assert_eq!(m.load_balancing_index, 0.0);
        assert_eq!(m.efficiency_score, 50.0);

        let labels: Vec<&str> = m.completion_types.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec![WITHOUT_FOLLOW_UP, WITH_FOLLOW_UP, NOT_COMPLETED]);
        assert!(m.completion_types.iter().all(|c| c.count == 0));

        let periods: Vec<&str> = m.trend.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2025-05-25", "2025-06-01", "2025-06-08", "2025-06-15"]);
        assert!(m.trend.iter().all(|p| p.throughput == 0));
    }

    #[test]
    fn test_apollo_scenario() {
        let m = compute_group_metrics_at("Apollo", &apollo(), now());
        assert_eq!(m.wip, 1);
        assert_eq!(m.throughput, 1);
        assert_eq!(m.aging_count, 1);
        assert_eq!(m.lead_time_days, 1.0);
        assert_eq!(m.cycle_time_days, 5.0);
        assert_eq!(m.wait_to_work_ratio, 0.2);
        assert_eq!(m.risk_score, 5.0);
        assert_eq!(m.efficiency_score, 100.0);
        assert_eq!(m.trend.last().unwrap().throughput, 1);
    }

    #[test]
    fn test_mixed_group_indicators() {
        let m = compute_group_metrics_at("Mixed", &mixed(), now());

        assert_eq!(m.lead_time_days, 1.6);
        assert_eq!(m.handover_delay_days, m.lead_time_days);
        assert_eq!(m.cycle_time_days, 1.2);
        assert_eq!(m.wait_to_work_ratio, 1.33);
        assert_eq!(m.wip, 1);
        assert_eq!(m.aging_count, 1);
        assert_eq!(m.throughput, 2);
        assert_eq!(m.overdue_severity_days, 1.5);
        assert_eq!(m.reopen_rate_pct, 50.0);
        assert_eq!(m.change_frequency, 0.8);
        assert_eq!(m.load_balancing_index, 0.47);
        assert_eq!(m.efficiency_score, 56.7);
        assert_eq!(m.risk_score, 19.0);

        let counts: Vec<u64> = m.completion_types.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![1, 1, 3]);

        let trend: Vec<u64> = m.trend.iter().map(|p| p.throughput).collect();
        assert_eq!(trend, vec![0, 0, 0, 2]);
    }

    #[test]
    fn test_inverted_start_clamps_lead_time() {
        let mut t = task("T-1", days_ago(2.0));
        t.started_at = Some(days_ago(5.0));
        t.status = Status::InProgress;
        let m = compute_group_metrics_at("Inverted", &[t], now());
        assert_eq!(m.lead_time_days, 0.0);
        assert_eq!(m.wait_to_work_ratio, 0.0);
    }

    #[test]
    fn test_aging_threshold_is_exclusive() {
        let at_threshold = task("T-1", days_ago(7.0));
        let m = compute_group_metrics_at("Edge", &[at_threshold], now());
        assert_eq!(m.aging_count, 0);

        let past_threshold = task("T-2", days_ago(7.1));
        let m = compute_group_metrics_at("Edge", &[past_threshold], now());
        assert_eq!(m.aging_count, 1);

        // Started tasks age from their start.
        let mut restarted = task("T-3", days_ago(30.0));
        restarted.status = Status::InProgress;
        restarted.started_at = Some(days_ago(7.0));
        let m = compute_group_metrics_at("Edge", &[restarted], now());
        assert_eq!(m.aging_count, 0);

        let mut finished = task("T-4", days_ago(30.0));
        finished.status = Status::Done;
        let m = compute_group_metrics_at("Edge", &[finished], now());
        assert_eq!(m.aging_count, 0);
    }

    #[test]
    fn test_completion_types_sum_to_task_count() {
        let tasks = mixed();
        let total: u64 = completion_types(&tasks).iter().map(|c| c.count).sum();
        assert_eq!(total, tasks.len() as u64);
    }

    #[test]
    fn test_trend_bins_are_half_open() {
        let mut on_edge = task("T-1", days_ago(30.0));
        on_edge.completed_at = Some(days_ago(7.0));
        let mut at_now = task("T-2", days_ago(30.0));
        at_now.completed_at = Some(now());
        let m = compute_group_metrics_at("Edges", &[on_edge, at_now], now());
        let trend: Vec<u64> = m.trend.iter().map(|p| p.throughput).collect();
        assert_eq!(trend, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_scores_clamped_for_degenerate_input() {
        let tasks: Vec<Task> = (0..30)
            .map(|i| {
                let mut t = task(&format!("T-{i}"), days_ago(60.0));
                t.status = Status::Blocked;
                t.started_at = Some(days_ago(50.0));
                t.reopened = true;
                t.changes_count = 20;
                t
            })
            .collect();
        let m = compute_group_metrics_at("Stuck", &tasks, now());
        assert_eq!(m.risk_score, 100.0);
        assert_eq!(m.reopen_rate_pct, 100.0);
        assert!((0.0..=100.0).contains(&m.efficiency_score));

        let overdue: Vec<Task> = (0..10)
            .map(|i| {
                let mut t = task(&format!("O-{i}"), days_ago(90.0));
                t.status = Status::Done;
                t.started_at = Some(days_ago(80.0));
                t.completed_at = Some(days_ago(1.0));
                t.overdue_days = Some(400);
                t
            })
            .collect();
        let m = compute_group_metrics_at("Late", &overdue, now());
        assert_eq!(m.risk_score, 100.0);
        assert!((0.0..=100.0).contains(&m.efficiency_score));
        assert!((0.0..=100.0).contains(&m.reopen_rate_pct));
    }

    #[test]
    fn test_group_risk_monotone_in_overdue_days() {
        let mut tasks = mixed();
        let mut previous = compute_group_metrics_at("Mixed", &tasks, now()).risk_score;
        for overdue in [4, 8, 16, 32] {
            tasks[0].overdue_days = Some(overdue);
            let risk = compute_group_metrics_at("Mixed", &tasks, now()).risk_score;
            assert!(risk >= previous, "{risk} < {previous} at {overdue} overdue days");
            previous = risk;
        }
    }

    #[test]
    fn test_same_instant_is_deterministic() {
        let tasks = mixed();
        assert_eq!(
            compute_group_metrics_at("Mixed", &tasks, now()),
            compute_group_metrics_at("Mixed", &tasks, now())
        );
    }

    #[test]
    fn test_stddev() {
        assert_eq!(stddev(&[]), 0.0);
        assert_eq!(stddev(&[4.0]), 0.0);
        assert_eq!(stddev(&[2.0, 2.0]), 0.0);
        assert_eq!(stddev(&[1.0, 3.0]), 1.0);
    }

    #[test]
    fn test_efficiency_score_weights() {
        assert_eq!(efficiency_score(100.0, 100.0, 100.0), 100.0);
        assert_eq!(efficiency_score(0.0, 100.0, 100.0), 50.0);
        assert_eq!(efficiency_score(100.0, 0.0, 0.0), 50.0);
        assert_eq!(efficiency_score(0.0, 0.0, 0.0), 0.0);
    }
}
