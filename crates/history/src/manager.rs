//! C10: ties the active map and completed cache together, and drives
//! write-behind calls into a [`HistoryStore`].
//!
//! Store errors are logged, never propagated — a slow or unavailable
//! `HistoryStore` must not fail a running execution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::active::ActiveMap;
use crate::completed::CompletedCache;
use crate::models::{ActionResult, ExecutionSnapshot, ExecutionStatus};
use crate::store::{HistoryFilter, HistoryStore, Paging, SnapshotPatch};

pub struct ExecutionHistory {
    active: ActiveMap,
    completed: CompletedCache,
    store: Arc<dyn HistoryStore>,
}

impl ExecutionHistory {
    pub fn new(store: Arc<dyn HistoryStore>, completed_capacity: usize) -> Self {
        Self { active: ActiveMap::new(), completed: CompletedCache::new(completed_capacity), store }
    }

    pub async fn start(&self, snapshot: ExecutionSnapshot) {
        if let Err(err) = self.store.create(&snapshot).await {
            tracing::warn!(execution_id = %snapshot.execution_id, error = %err, "history store create failed");
        }
        self.active.insert(snapshot);
    }

    /// Record a finalized action result and push the patch write-behind.
    pub async fn record_action_result(&self, execution_id: Uuid, result: ActionResult) {
        let applied = self.active.update(execution_id, |snapshot| {
            if let Some(existing) = snapshot.action_results.iter_mut().find(|r| r.action_id == result.action_id) {
                *existing = result.clone();
            } else {
                snapshot.action_results.push(result.clone());
            }
            snapshot.recompute_progress();
            snapshot.current_action_id = if result.is_terminal() { None } else { Some(result.action_id.clone()) };
        });

        if !applied {
            return;
        }

        if let Some(snapshot) = self.active.get(execution_id) {
            let patch = SnapshotPatch {
                current_action_id: Some(snapshot.current_action_id.clone()),
                action_results: Some(serde_json::to_value(&snapshot.action_results).unwrap_or_default()),
                progress: Some(serde_json::to_value(snapshot.progress).unwrap_or_default()),
                ..Default::default()
            };
            if let Err(err) = self.store.update(execution_id, patch).await {
                tracing::warn!(%execution_id, error = %err, "history store update failed");
            }
        }
    }

    pub async fn finish(&self, execution_id: Uuid, status: ExecutionStatus, at: DateTime<Utc>, error: Option<String>) {
        let Some(mut snapshot) = self.active.remove(execution_id) else { return };
        snapshot.finish(status, at, error.clone());

        let patch = SnapshotPatch {
            status: Some(status),
            current_action_id: Some(None),
            ended_at: Some(at),
            duration_ms: snapshot.duration_ms,
            error: Some(error),
            ..Default::default()
        };
        if let Err(err) = self.store.update(execution_id, patch).await {
            tracing::warn!(%execution_id, error = %err, "history store update failed");
        }

        self.completed.insert(snapshot);
    }

    pub fn snapshot(&self, execution_id: Uuid) -> Option<ExecutionSnapshot> {
        self.active.get(execution_id).or_else(|| self.completed.get(execution_id))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub async fn query(&self, filter: HistoryFilter, paging: Paging) -> Result<Vec<ExecutionSnapshot>, crate::error::HistoryError> {
        self.store.query(filter, paging).await
    }

    pub async fn aggregate(&self, filter: HistoryFilter) -> Result<crate::store::AggregateResult, crate::error::HistoryError> {
        self.store.aggregate(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionStatus, Progress};
    use crate::store::AggregateResult;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct NullStore {
        creates: StdMutex<usize>,
        updates: StdMutex<usize>,
    }

    #[async_trait]
    impl HistoryStore for NullStore {
        async fn create(&self, _snapshot: &ExecutionSnapshot) -> Result<(), crate::error::HistoryError> {
            *self.creates.lock().unwrap() += 1;
            Ok(())
        }
        async fn update(&self, _execution_id: Uuid, _patch: SnapshotPatch) -> Result<(), crate::error::HistoryError> {
            *self.updates.lock().unwrap() += 1;
            Ok(())
        }
        async fn query(&self, _filter: HistoryFilter, _paging: Paging) -> Result<Vec<ExecutionSnapshot>, crate::error::HistoryError> {
            Ok(vec![])
        }
        async fn aggregate(&self, _filter: HistoryFilter) -> Result<AggregateResult, crate::error::HistoryError> {
            Ok(AggregateResult::default())
        }
        async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64, crate::error::HistoryError> {
            Ok(0)
        }
    }

    fn new_snapshot(id: Uuid) -> ExecutionSnapshot {
        ExecutionSnapshot::new(id, "wf", Utc::now(), 2, Value::Null)
    }

    #[tokio::test]
    async fn start_then_finish_moves_execution_to_completed() {
        let history = ExecutionHistory::new(Arc::new(NullStore::default()), 10);
        let id = Uuid::new_v4();
        history.start(new_snapshot(id)).await;
        assert_eq!(history.active_count(), 1);

        history.finish(id, ExecutionStatus::Completed, Utc::now(), None).await;
        assert_eq!(history.active_count(), 0);
        assert!(history.snapshot(id).is_some());
    }

    #[tokio::test]
    async fn recording_action_results_updates_progress() {
        let history = ExecutionHistory::new(Arc::new(NullStore::default()), 10);
        let id = Uuid::new_v4();
        history.start(new_snapshot(id)).await;

        let mut result = ActionResult::pending("a1", "http_request");
        result.status = ActionStatus::Completed;
        history.record_action_result(id, result).await;

        let snapshot = history.snapshot(id).unwrap();
        assert_eq!(snapshot.progress.completed, 1);
        assert_eq!(snapshot.progress, Progress { completed: 1, failed: 0, skipped: 0, total: 2, percentage: 50 });
    }
}
