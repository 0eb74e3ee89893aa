use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Workflow status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    InProgress,
    Blocked,
    Done,
}

impl Status {
    /// In progress or blocked: counts towards WIP.
    pub fn is_active(&self) -> bool {
        matches!(self, Status::InProgress | Status::Blocked)
    }
}

/// A task record as exported by the tracker.
///
/// Timestamps are taken as given: the usual ordering
/// `created_at <= started_at <= completed_at` is not validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub assigner: String,
    #[serde(default)]
    pub assignee: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Days past the due date at completion. Zero or absent means on time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdue_days: Option<u32>,
    #[serde(default)]
    pub reopened: bool,
    #[serde(default)]
    pub changes_count: u32,
    #[serde(default)]
    pub follow_ups: u32,
    #[serde(default)]
    pub self_initiated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    /// Id of a task this one waits on. Never checked against the collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

impl Task {
    /// A new, unassigned task with medium priority and no optional data.
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            project: String::new(),
            department: String::new(),
            assigner: String::new(),
            assignee: String::new(),
            priority: Priority::Medium,
            status: Status::New,
            created_at,
            started_at: None,
            completed_at: None,
            due_date: None,
            overdue_days: None,
            reopened: false,
            changes_count: 0,
            follow_ups: 0,
            self_initiated: false,
            estimated_hours: None,
            actual_hours: None,
            depends_on: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Completed with no overdue days recorded.
    pub fn is_on_time(&self) -> bool {
        self.overdue_days.unwrap_or(0) == 0
    }

    /// Start of the task's current age: `started_at`, falling back to `created_at`.
    pub fn age_anchor(&self) -> DateTime<Utc> {
        self.started_at.unwrap_or(self.created_at)
    }

    /// The blocking task id, treating an empty string as no dependency.
    pub fn dependency(&self) -> Option<&str> {
        self.depends_on.as_deref().filter(|id| !id.is_empty())
    }

    /// True when a later lifecycle timestamp precedes an earlier one.
    pub fn has_inverted_timestamps(&self) -> bool {
        let started_early = self.started_at.is_some_and(|s| s < self.created_at);
        let completed_early = match (self.started_at, self.completed_at) {
            (Some(s), Some(c)) => c < s,
            _ => false,
        };
        started_early || completed_early
    }
}
