use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::date_util::{round_to, whole_days};
use crate::task::{Status, Task};

use super::{borrowed, TaskRisk};

/// Whole days an open task may age before it starts accruing risk.
const AGING_GRACE_DAYS: i64 = 7;
/// Whole days a task may wait to be picked up before it starts accruing risk.
const PICKUP_GRACE_DAYS: i64 = 4;
/// Due within this many days counts as due soon.
const DUE_SOON_DAYS: i64 = 2;

const MAX_RISK: f64 = 100.0;

/// A contributing factor to a task's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFactor {
    Blocked,
    /// Whole days since the task was started (or created, if never started).
    Aging(i64),
    /// Whole days between creation and start.
    SlowPickup(i64),
    /// Whole days past the due date.
    Overdue(i64),
    /// Whole days left until the due date.
    DueSoon(i64),
    HasDependency,
}

impl RiskFactor {
    pub fn points(&self) -> f64 {
        let points = match self {
            RiskFactor::Blocked => 35,
            RiskFactor::Aging(age) => ((age - AGING_GRACE_DAYS) * 2).min(25),
            RiskFactor::SlowPickup(wait) => ((wait - PICKUP_GRACE_DAYS) * 2).min(15),
            RiskFactor::Overdue(days) => (days * 3).min(25),
            RiskFactor::DueSoon(_) => 15,
            RiskFactor::HasDependency => 10,
        };
        points as f64
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFactor::Blocked => write!(f, "Blocked"),
            RiskFactor::Aging(age) => write!(f, "Aging {age}d"),
            RiskFactor::SlowPickup(wait) => write!(f, "Slow pickup {wait}d"),
            RiskFactor::Overdue(days) => write!(f, "{days}d overdue"),
            RiskFactor::DueSoon(days) => write!(f, "Due soon ({days}d)"),
            RiskFactor::HasDependency => write!(f, "Has dependency"),
        }
    }
}

/// Factors that apply to `task` at `now`, in evaluation order.
///
/// Every factor that fires contributes a reason, so the explanation reads in
/// the same order as the score was built.
pub fn risk_factors(task: &Task, now: DateTime<Utc>) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if task.status == Status::Blocked {
        factors.push(RiskFactor::Blocked);
    }

    let age = whole_days(task.age_anchor(), now);
    if age > AGING_GRACE_DAYS {
        factors.push(RiskFactor::Aging(age));
    }

    let wait = task
        .started_at
        .map_or(0, |started| whole_days(task.created_at, started));
    if wait > PICKUP_GRACE_DAYS {
        factors.push(RiskFactor::SlowPickup(wait));
    }

    if let Some(due) = task.due_date {
        let due_in = whole_days(now, due);
        if due_in < 0 {
            factors.push(RiskFactor::Overdue(due_in.abs()));
        } else if due_in <= DUE_SOON_DAYS {
            factors.push(RiskFactor::DueSoon(due_in));
        }
    }

    if task.dependency().is_some() {
        factors.push(RiskFactor::HasDependency);
    }

    factors
}

/// Score every open task as of the current wall-clock time.
pub fn compute_task_risk<T: Borrow<Task>>(tasks: &[T]) -> Vec<TaskRisk> {
    compute_task_risk_at(tasks, Utc::now())
}

/// Score every task that is not done as of `now`, highest risk first.
///
/// Tasks with equal scores keep their input order.
pub fn compute_task_risk_at<T: Borrow<Task>>(tasks: &[T], now: DateTime<Utc>) -> Vec<TaskRisk> {
    let mut risks: Vec<TaskRisk> = borrowed(tasks)
        .into_iter()
        .filter(|t| t.status != Status::Done)
        .map(|t| assess(t, now))
        .collect();
    risks.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));

    log::debug!(
        "Scored {} open tasks, {} with non-zero risk",
        risks.len(),
        risks.iter().filter(|r| r.risk_score > 0.0).count()
    );
    risks
}

fn assess(task: &Task, now: DateTime<Utc>) -> TaskRisk {
    let factors = risk_factors(task, now);
    let raw: f64 = factors.iter().map(RiskFactor::points).sum();

    TaskRisk {
        id: task.id.clone(),
        title: task.title.clone(),
        assignee: task.assignee.clone(),
        project: task.project.clone(),
        department: task.department.clone(),
        due_in_days: task.due_date.map(|due| whole_days(now, due)),
        risk_score: round_to(raw.clamp(0.0, MAX_RISK), 1),
        reasons: factors.iter().map(ToString::to_string).collect(),
    }
}
