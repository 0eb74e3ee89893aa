use std::borrow::Borrow;

use crate::date_util::round_to;
use crate::task::Task;

use super::{borrowed, pickup_days, FlowDistribution, HistogramBucket};

/// Largest overdue bucket; more days overdue land here.
const OVERDUE_BUCKETS: u32 = 8;
/// Largest pickup bucket; slower pickups land here.
const PICKUP_BUCKETS: u32 = 10;

/// Overdue severity over completed tasks and pickup latency over all tasks.
pub fn compute_flow_distribution<T: Borrow<Task>>(tasks: &[T]) -> FlowDistribution {
    let tasks = borrowed(tasks);
    let completed: Vec<&Task> = tasks.iter().copied().filter(|t| t.is_completed()).collect();

    let overdue: Vec<u32> = completed
        .iter()
        .map(|t| t.overdue_days.unwrap_or(0))
        .collect();
    let pickup: Vec<f64> = tasks.iter().map(|t| pickup_days(t)).collect();

    let overdue_total: f64 = overdue.iter().map(|&d| f64::from(d)).sum();
    let pickup_total: f64 = pickup.iter().sum();

    FlowDistribution {
        avg_overdue_days: round_to(overdue_total / completed.len().max(1) as f64, 2),
        avg_pickup_days: round_to(pickup_total / tasks.len().max(1) as f64, 2),
        overdue_histogram: histogram(overdue.iter().copied(), OVERDUE_BUCKETS),
        pickup_histogram: histogram(pickup.iter().map(|d| d.floor() as u32), PICKUP_BUCKETS),
    }
}

/// Count values into buckets `0..=last`, clamping larger values into `last`.
fn histogram(values: impl Iterator<Item = u32>, last: u32) -> Vec<HistogramBucket> {
    let mut buckets: Vec<HistogramBucket> = (0..=last)
        .map(|bucket| HistogramBucket { bucket, count: 0 })
        .collect();
    for value in values {
        buckets[value.min(last) as usize].count += 1;
    }
    buckets
}
