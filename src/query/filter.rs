use chrono::NaiveDate;

use crate::error::Result;
use crate::query::period::Period;
use crate::task::{Priority, Task};

/// Builder for narrowing a task collection before computing metrics.
///
/// All criteria are optional and combine with AND. Filtering never reorders
/// tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    created_from: Option<NaiveDate>,
    created_to: Option<NaiveDate>,
    priority: Option<Priority>,
    project: Option<String>,
    department: Option<String>,
    assignee: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep tasks created within `period` as seen on `as_of`.
    pub fn period(self, period: &Period, as_of: NaiveDate) -> Result<Self> {
        let (from, to) = period.date_range(as_of)?;
        Ok(self.created_between(from, to))
    }

    /// Keep tasks whose creation date falls within `from..=to`.
    pub fn created_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        self
    }

    pub fn department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn assignee(mut self, assignee: &str) -> Self {
        self.assignee = Some(assignee.to_string());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        let created = task.created_at.date_naive();
        if self.created_from.is_some_and(|from| created < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| created > to) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if self.project.as_deref().is_some_and(|p| task.project != p) {
            return false;
        }
        if self.department.as_deref().is_some_and(|d| task.department != d) {
            return false;
        }
        if self.assignee.as_deref().is_some_and(|a| task.assignee != a) {
            return false;
        }
        true
    }

    /// Borrow the matching tasks, in input order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }

    /// Keep only the matching tasks, in input order.
    pub fn retain(&self, tasks: Vec<Task>) -> Vec<Task> {
        let before = tasks.len();
        let kept: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        log::debug!("Filter kept {} of {before} tasks", kept.len());
        kept
    }
}
