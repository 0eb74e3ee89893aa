pub mod config;
pub mod date_util;
pub mod error;
pub mod input;
pub mod metrics;
pub mod query;
pub mod task;

#[cfg(test)]
mod test_support;

pub use config::DashboardConfig;
pub use error::{Error, Result};
pub use metrics::{
    Blocker, CompletionType, EfficiencyTrend, FlowDistribution, GroupField, GroupHealth,
    GroupMetrics, Health, TaskRisk,
};
pub use query::filter::TaskFilter;
pub use query::period::Period;
pub use task::{Priority, Status, Task};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which dimension the per-group cards are built for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DashboardMode {
    Projects,
    Departments,
}

impl DashboardMode {
    pub fn field(&self) -> GroupField {
        match self {
            DashboardMode::Projects => GroupField::Project,
            DashboardMode::Departments => GroupField::Department,
        }
    }
}

/// Group indicators with their threshold classification.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    #[serde(flatten)]
    pub metrics: GroupMetrics,
    pub health: GroupHealth,
}

/// An at-risk task with its threshold classification.
#[derive(Debug, Clone, Serialize)]
pub struct EarlyWarning {
    #[serde(flatten)]
    pub risk: TaskRisk,
    pub health: Health,
}

/// Monthly efficiency at organization, department and individual level.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyTrends {
    pub organization: EfficiencyTrend,
    pub departments: EfficiencyTrend,
    pub people: EfficiencyTrend,
}

/// Everything the dashboard shows, computed against one instant.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub mode: DashboardMode,
    pub task_count: u64,
    pub groups: Vec<GroupReport>,
    pub early_warnings: Vec<EarlyWarning>,
    pub trends: EfficiencyTrends,
    pub flow: FlowDistribution,
    pub segmentation: Vec<CompletionType>,
    pub top_blockers: Vec<Blocker>,
}

/// Main entry point: a snapshot of tasks plus dashboard settings.
///
/// Every computation is a pure function of the snapshot and the evaluation
/// instant; nothing is cached between calls.
pub struct Dashboard {
    tasks: Vec<Task>,
    config: DashboardConfig,
    excluded: usize,
}

impl Dashboard {
    pub fn new(tasks: Vec<Task>, config: DashboardConfig) -> Self {
        Self {
            tasks,
            config,
            excluded: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Number of loaded tasks dropped by [`Dashboard::filtered`] so far.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Keep only the tasks matching `filter`.
    pub fn filtered(self, filter: &TaskFilter) -> Self {
        let before = self.tasks.len();
        let tasks = filter.retain(self.tasks);
        Self {
            excluded: self.excluded + (before - tasks.len()),
            tasks,
            config: self.config,
        }
    }

    /// Indicators for every group of `field`, in order of first appearance.
    pub fn group_reports_at(&self, field: GroupField, now: DateTime<Utc>) -> Vec<GroupReport> {
        metrics::group(&self.tasks, field)
            .iter()
            .map(|(name, tasks)| {
                let metrics = metrics::compute_group_metrics_at(name, tasks, now);
                let health = GroupHealth::from_metrics(&metrics);
                GroupReport { metrics, health }
            })
            .collect()
    }

    /// The riskiest open tasks, up to the configured limit.
    pub fn early_warnings_at(&self, now: DateTime<Utc>) -> Vec<EarlyWarning> {
        metrics::compute_task_risk_at(&self.tasks, now)
            .into_iter()
            .take(self.config.early_warning_limit)
            .map(|risk| EarlyWarning {
                health: Health::of_risk(risk.risk_score),
                risk,
            })
            .collect()
    }

    pub fn efficiency_trends_at(&self, now: DateTime<Utc>) -> EfficiencyTrends {
        let months = self.config.trend_months;
        let top_k = self.config.trend_top_keys;
        EfficiencyTrends {
            organization: metrics::compute_org_efficiency_at(&self.tasks, months, now),
            departments: metrics::compute_efficiency_trend_at(
                &self.tasks,
                GroupField::Department,
                months,
                top_k,
                now,
            ),
            people: metrics::compute_efficiency_trend_at(
                &self.tasks,
                GroupField::Assignee,
                months,
                top_k,
                now,
            ),
        }
    }

    pub fn flow(&self) -> FlowDistribution {
        metrics::compute_flow_distribution(&self.tasks)
    }

    /// Organization-wide completion segmentation.
    pub fn segmentation(&self) -> Vec<CompletionType> {
        metrics::completion_types(&self.tasks)
    }

    pub fn top_blockers(&self) -> Vec<Blocker> {
        metrics::top_blockers(&self.tasks, self.config.blocker_limit)
    }

    /// Build the full dashboard as of the current wall-clock time.
    pub fn report(&self, mode: DashboardMode) -> DashboardReport {
        self.report_at(mode, Utc::now())
    }

    pub fn report_at(&self, mode: DashboardMode, now: DateTime<Utc>) -> DashboardReport {
        log::info!(
            "Building {:?} dashboard over {} tasks as of {}",
            mode,
            self.tasks.len(),
            now.to_rfc3339()
        );
        DashboardReport {
            generated_at: now,
            mode,
            task_count: self.tasks.len() as u64,
            groups: self.group_reports_at(mode.field(), now),
            early_warnings: self.early_warnings_at(now),
            trends: self.efficiency_trends_at(now),
            flow: self.flow(),
            segmentation: self.segmentation(),
            top_blockers: self.top_blockers(),
        }
    }
}
