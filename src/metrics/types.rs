use indexmap::IndexMap;
use serde::Serialize;

/// One slice of the completion segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionType {
    pub label: &'static str,
    pub count: u64,
}

/// Completed-task count for one weekly bin, labelled with the bin's end date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub throughput: u64,
}

/// Leading and lagging indicators for one group of tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMetrics {
    pub name: String,

    // Leading
    pub lead_time_days: f64,
    pub cycle_time_days: f64,
    pub wip: u64,
    /// Open tasks older than the aging threshold at evaluation time.
    pub aging_count: u64,
    /// Same series as lead time.
    pub handover_delay_days: f64,
    pub wait_to_work_ratio: f64,
    /// Composite 0-100, higher is worse.
    pub risk_score: f64,

    // Lagging
    pub throughput: u64,
    pub overdue_severity_days: f64,
    pub reopen_rate_pct: f64,
    pub change_frequency: f64,
    /// Std-dev of tasks per assignee. Lower is better.
    pub load_balancing_index: f64,
    /// Composite 0-100, higher is better.
    pub efficiency_score: f64,

    pub completion_types: Vec<CompletionType>,
    pub trend: Vec<TrendPoint>,
}

/// Risk assessment for one open task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRisk {
    pub id: String,
    pub title: String,
    pub assignee: String,
    pub project: String,
    pub department: String,
    /// Negative when overdue. Absent without a due date.
    pub due_in_days: Option<i64>,
    pub risk_score: f64,
    pub reasons: Vec<String>,
}

/// Monthly efficiency scores for the most populous keys of a dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyTrend {
    pub months: Vec<String>,
    pub keys: Vec<String>,
    /// month -> key -> score
    pub series: IndexMap<String, IndexMap<String, f64>>,
}

impl EfficiencyTrend {
    /// Score for a key in a month, if both are part of the trend.
    pub fn score(&self, month: &str, key: &str) -> Option<f64> {
        self.series.get(month)?.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub bucket: u32,
    pub count: u64,
}

/// Overdue severity and pickup latency across a whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowDistribution {
    pub avg_overdue_days: f64,
    pub avg_pickup_days: f64,
    /// Completed tasks by overdue days, last bucket open-ended.
    pub overdue_histogram: Vec<HistogramBucket>,
    /// All tasks by whole days to start, last bucket open-ended.
    pub pickup_histogram: Vec<HistogramBucket>,
}

/// A task that other tasks depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocker {
    pub id: String,
    pub dependents: u64,
}
