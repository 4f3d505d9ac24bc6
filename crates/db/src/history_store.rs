//! Postgres-backed implementation of `history::HistoryStore`.
//!
//! Snapshots are stored as JSON; the aggregate/query surface decodes the
//! matching rows and defers to `history::aggregate::compute` so the
//! bucketing/ranking logic lives in one place regardless of which store is
//! backing it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use history::{AggregateResult, ExecutionSnapshot, HistoryError, HistoryFilter, HistoryStore, Paging, SnapshotPatch};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::executions;

pub struct PostgresHistoryStore {
    pool: PgPool,
}

impl PostgresHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn decode(&self, execution_id: Uuid) -> Result<ExecutionSnapshot, HistoryError> {
        let row = executions::get_snapshot(&self.pool, execution_id)
            .await
            .map_err(|e| HistoryError::Store(e.to_string()))?;
        serde_json::from_value(row.snapshot).map_err(|e| HistoryError::Store(e.to_string()))
    }
}

#[async_trait]
impl HistoryStore for PostgresHistoryStore {
    async fn create(&self, snapshot: &ExecutionSnapshot) -> Result<(), HistoryError> {
        let json = serde_json::to_value(snapshot).map_err(|e| HistoryError::Store(e.to_string()))?;
        executions::insert_snapshot(
            &self.pool,
            snapshot.execution_id,
            &snapshot.workflow_name,
            status_label(snapshot.status),
            snapshot.started_at,
            snapshot.ended_at,
            json,
        )
        .await
        .map_err(|e| HistoryError::Store(e.to_string()))
    }

    async fn update(&self, execution_id: Uuid, patch: SnapshotPatch) -> Result<(), HistoryError> {
        let mut snapshot = self.decode(execution_id).await?;

        if let Some(status) = patch.status {
            snapshot.status = status;
        }
        if let Some(current_action_id) = patch.current_action_id {
            snapshot.current_action_id = current_action_id;
        }
        if let Some(action_results) = patch.action_results {
            snapshot.action_results = serde_json::from_value(action_results).map_err(|e| HistoryError::Store(e.to_string()))?;
        }
        if let Some(progress) = patch.progress {
            snapshot.progress = serde_json::from_value(progress).map_err(|e| HistoryError::Store(e.to_string()))?;
        }
        if let Some(ended_at) = patch.ended_at {
            snapshot.ended_at = Some(ended_at);
        }
        if let Some(duration_ms) = patch.duration_ms {
            snapshot.duration_ms = Some(duration_ms);
        }
        if let Some(error) = patch.error {
            snapshot.error = error;
        }

        let json = serde_json::to_value(&snapshot).map_err(|e| HistoryError::Store(e.to_string()))?;
        executions::update_snapshot(&self.pool, execution_id, status_label(snapshot.status), snapshot.ended_at, json)
            .await
            .map_err(|e| match e {
                crate::DbError::NotFound => HistoryError::NotFound(execution_id),
                other => HistoryError::Store(other.to_string()),
            })
    }

    async fn query(&self, filter: HistoryFilter, paging: Paging) -> Result<Vec<ExecutionSnapshot>, HistoryError> {
        let rows = executions::query_snapshots(&self.pool, filter.workflow_name.as_deref(), filter.from, filter.to)
            .await
            .map_err(|e| HistoryError::Store(e.to_string()))?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            let snapshot: ExecutionSnapshot = serde_json::from_value(row.snapshot).map_err(|e| HistoryError::Store(e.to_string()))?;
            if let Some(statuses) = &filter.statuses {
                if !statuses.contains(&snapshot.status) {
                    continue;
                }
            }
            snapshots.push(snapshot);
        }

        Ok(snapshots.into_iter().skip(paging.offset).take(paging.limit).collect())
    }

    async fn aggregate(&self, filter: HistoryFilter) -> Result<AggregateResult, HistoryError> {
        let rows = executions::query_snapshots(&self.pool, filter.workflow_name.as_deref(), filter.from, filter.to)
            .await
            .map_err(|e| HistoryError::Store(e.to_string()))?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            let snapshot: ExecutionSnapshot = serde_json::from_value(row.snapshot).map_err(|e| HistoryError::Store(e.to_string()))?;
            if let Some(statuses) = &filter.statuses {
                if !statuses.contains(&snapshot.status) {
                    continue;
                }
            }
            snapshots.push(snapshot);
        }

        Ok(history::aggregate::compute(&snapshots))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, HistoryError> {
        executions::delete_older_than(&self.pool, cutoff)
            .await
            .map_err(|e| HistoryError::Store(e.to_string()))
    }
}

fn status_label(status: history::ExecutionStatus) -> &'static str {
    match status {
        history::ExecutionStatus::Running => "running",
        history::ExecutionStatus::Completed => "completed",
        history::ExecutionStatus::Failed => "failed",
        history::ExecutionStatus::Cancelled => "cancelled",
        history::ExecutionStatus::Timeout => "timeout",
    }
}
