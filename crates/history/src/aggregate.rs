//! Pure aggregation math shared by `HistoryStore` implementations.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};

use crate::models::{ExecutionSnapshot, ExecutionStatus};
use crate::store::AggregateResult;

/// Computes the aggregate summary spec'd for C10 over an in-memory slice of
/// snapshots. Relational implementations may prefer to push this down into
/// SQL, but must match these semantics.
pub fn compute(snapshots: &[ExecutionSnapshot]) -> AggregateResult {
    let total = snapshots.len() as u64;
    if total == 0 {
        return AggregateResult::default();
    }

    let completed: Vec<&ExecutionSnapshot> =
        snapshots.iter().filter(|s| s.status == ExecutionStatus::Completed).collect();
    let success_rate = completed.len() as f64 / total as f64;

    let average_duration_ms = if completed.is_empty() {
        0.0
    } else {
        let sum: i64 = completed.iter().filter_map(|s| s.duration_ms).sum();
        sum as f64 / completed.len() as f64
    };

    let mut error_counts: HashMap<String, u64> = HashMap::new();
    for s in snapshots {
        if let Some(err) = &s.error {
            *error_counts.entry(err.clone()).or_insert(0) += 1;
        }
    }
    let mut top_errors: Vec<(String, u64)> = error_counts.into_iter().collect();
    top_errors.sort_by(|a, b| b.1.cmp(&a.1));
    top_errors.truncate(10);

    let per_hour = bucket(snapshots, |t| t.with_minute(0).unwrap().with_second(0).unwrap().with_nanosecond(0).unwrap());
    let per_day = bucket(snapshots, |t| t.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc());

    AggregateResult { total_executions: total, success_rate, average_duration_ms, top_errors, per_hour, per_day }
}

fn bucket(
    snapshots: &[ExecutionSnapshot],
    bucket_fn: impl Fn(DateTime<Utc>) -> DateTime<Utc>,
) -> Vec<(DateTime<Utc>, u64)> {
    let mut counts: HashMap<DateTime<Utc>, u64> = HashMap::new();
    for s in snapshots {
        *counts.entry(bucket_fn(s.started_at)).or_insert(0) += 1;
    }
    let mut buckets: Vec<(DateTime<Utc>, u64)> = counts.into_iter().collect();
    buckets.sort_by_key(|(t, _)| *t);
    buckets
}
