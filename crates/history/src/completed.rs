//! Bounded completed-execution cache, LRU by most recent start time.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::ExecutionSnapshot;

pub struct CompletedCache {
    capacity: usize,
    inner: Mutex<HashMap<Uuid, ExecutionSnapshot>>,
}

impl CompletedCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(HashMap::new()) }
    }

    pub fn insert(&self, snapshot: ExecutionSnapshot) {
        let mut guard = self.inner.lock().expect("completed cache mutex poisoned");
        guard.insert(snapshot.execution_id, snapshot);
        if guard.len() > self.capacity {
            let overflow = guard.len() - self.capacity;
            let mut by_age: Vec<(Uuid, chrono::DateTime<chrono::Utc>)> =
                guard.iter().map(|(id, s)| (*id, s.started_at)).collect();
            by_age.sort_by_key(|(_, started_at)| *started_at);
            for (id, _) in by_age.into_iter().take(overflow) {
                guard.remove(&id);
            }
        }
    }

    pub fn get(&self, execution_id: Uuid) -> Option<ExecutionSnapshot> {
        self.inner.lock().expect("completed cache mutex poisoned").get(&execution_id).cloned()
    }

    pub fn all(&self) -> Vec<ExecutionSnapshot> {
        self.inner.lock().expect("completed cache mutex poisoned").values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("completed cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionStatus, Progress};
    use serde_json::Value;

    fn snapshot(id: Uuid, started_at: chrono::DateTime<chrono::Utc>) -> ExecutionSnapshot {
        ExecutionSnapshot {
            execution_id: id,
            workflow_name: "wf".into(),
            status: ExecutionStatus::Completed,
            started_at,
            ended_at: None,
            duration_ms: Some(10),
            current_action_id: None,
            progress: Progress::default(),
            context: Value::Null,
            action_results: vec![],
            error: None,
            metrics: Value::Null,
        }
    }

    #[test]
    fn evicts_oldest_by_start_time_on_overflow() {
        let cache = CompletedCache::new(2);
        let now = chrono::Utc::now();
        let oldest = Uuid::new_v4();
        cache.insert(snapshot(oldest, now));
        cache.insert(snapshot(Uuid::new_v4(), now + chrono::Duration::seconds(1)));
        cache.insert(snapshot(Uuid::new_v4(), now + chrono::Duration::seconds(2)));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(oldest).is_none());
    }
}
