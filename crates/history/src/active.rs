//! The active-execution map: `executionId -> snapshot` for in-flight runs.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::ExecutionSnapshot;

#[derive(Default)]
pub struct ActiveMap {
    inner: Mutex<HashMap<Uuid, ExecutionSnapshot>>,
}

impl ActiveMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, snapshot: ExecutionSnapshot) {
        self.inner.lock().expect("active map mutex poisoned").insert(snapshot.execution_id, snapshot);
    }

    pub fn get(&self, execution_id: Uuid) -> Option<ExecutionSnapshot> {
        self.inner.lock().expect("active map mutex poisoned").get(&execution_id).cloned()
    }

    /// Apply `mutate` to the snapshot in place, if it is still active.
    pub fn update<F: FnOnce(&mut ExecutionSnapshot)>(&self, execution_id: Uuid, mutate: F) -> bool {
        let mut guard = self.inner.lock().expect("active map mutex poisoned");
        match guard.get_mut(&execution_id) {
            Some(snapshot) => {
                mutate(snapshot);
                true
            }
            None => false,
        }
    }

    /// Removes and returns a snapshot, e.g. on completion so it can move
    /// into the completed cache.
    pub fn remove(&self, execution_id: Uuid) -> Option<ExecutionSnapshot> {
        self.inner.lock().expect("active map mutex poisoned").remove(&execution_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("active map mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Progress;
    use serde_json::Value;

    fn snapshot(id: Uuid) -> ExecutionSnapshot {
        ExecutionSnapshot {
            execution_id: id,
            workflow_name: "wf".into(),
            status: crate::models::ExecutionStatus::Running,
            started_at: chrono::Utc::now(),
            ended_at: None,
            duration_ms: None,
            current_action_id: None,
            progress: Progress::default(),
            context: Value::Null,
            action_results: vec![],
            error: None,
            metrics: Value::Null,
        }
    }

    #[test]
    fn insert_get_remove_round_trip() {
        let map = ActiveMap::new();
        let id = Uuid::new_v4();
        map.insert(snapshot(id));
        assert!(map.get(id).is_some());
        assert!(map.remove(id).is_some());
        assert!(map.get(id).is_none());
    }

    #[test]
    fn update_mutates_in_place() {
        let map = ActiveMap::new();
        let id = Uuid::new_v4();
        map.insert(snapshot(id));
        let applied = map.update(id, |s| s.current_action_id = Some("a1".into()));
        assert!(applied);
        assert_eq!(map.get(id).unwrap().current_action_id, Some("a1".into()));
    }

    #[test]
    fn update_on_missing_id_returns_false() {
        let map = ActiveMap::new();
        assert!(!map.update(Uuid::new_v4(), |_| {}));
    }
}
