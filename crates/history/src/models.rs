//! Execution snapshots and the action-result records they aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub action_type: String,
    pub status: ActionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub retry_count: u32,
}

impl ActionResult {
    pub fn pending(action_id: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            action_type: action_type.into(),
            status: ActionStatus::Pending,
            started_at: None,
            ended_at: None,
            output: None,
            error: None,
            retry_count: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ActionStatus::Completed | ActionStatus::Failed | ActionStatus::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

/// Derived progress counters; always recomputable from `action_results`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub percentage: u8,
}

impl Progress {
    pub fn recompute(action_results: &[ActionResult], total: usize) -> Self {
        let completed = action_results.iter().filter(|a| a.status == ActionStatus::Completed).count();
        let failed = action_results.iter().filter(|a| a.status == ActionStatus::Failed).count();
        let skipped = action_results.iter().filter(|a| a.status == ActionStatus::Skipped).count();
        let percentage = if total == 0 {
            100
        } else {
            (((completed + failed + skipped) as f64 / total as f64) * 100.0).round() as u8
        };
        Self { completed, failed, skipped, total, percentage }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub execution_id: Uuid,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub current_action_id: Option<String>,
    pub progress: Progress,
    pub context: Value,
    pub action_results: Vec<ActionResult>,
    pub error: Option<String>,
    pub metrics: Value,
}

impl ExecutionSnapshot {
    pub fn new(execution_id: Uuid, workflow_name: impl Into<String>, started_at: DateTime<Utc>, total_actions: usize, context: Value) -> Self {
        Self {
            execution_id,
            workflow_name: workflow_name.into(),
            status: ExecutionStatus::Running,
            started_at,
            ended_at: None,
            duration_ms: None,
            current_action_id: None,
            progress: Progress { total: total_actions, ..Progress::default() },
            context,
            action_results: Vec::new(),
            error: None,
            metrics: Value::Null,
        }
    }

    /// Recompute `progress` from `action_results`. Idempotent.
    pub fn recompute_progress(&mut self) {
        self.progress = Progress::recompute(&self.action_results, self.progress.total);
    }

    pub fn finish(&mut self, status: ExecutionStatus, ended_at: DateTime<Utc>, error: Option<String>) {
        self.status = status;
        self.ended_at = Some(ended_at);
        self.duration_ms = Some((ended_at - self.started_at).num_milliseconds());
        self.error = error;
        self.current_action_id = None;
    }
}
