//! The `HistoryStore` capability: a durable, write-behind sink for
//! execution snapshots. Implementations are free to be relational,
//! document-based, or in-memory; errors are logged and never fail the
//! execution that triggered them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HistoryError;
use crate::models::{ExecutionSnapshot, ExecutionStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub workflow_name: Option<String>,
    pub statuses: Option<Vec<ExecutionStatus>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Paging {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

/// A partial update applied to an already-created snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPatch {
    pub status: Option<ExecutionStatus>,
    pub current_action_id: Option<Option<String>>,
    pub action_results: Option<serde_json::Value>,
    pub progress: Option<serde_json::Value>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub error: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total_executions: u64,
    pub success_rate: f64,
    pub average_duration_ms: f64,
    pub top_errors: Vec<(String, u64)>,
    pub per_hour: Vec<(DateTime<Utc>, u64)>,
    pub per_day: Vec<(DateTime<Utc>, u64)>,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create(&self, snapshot: &ExecutionSnapshot) -> Result<(), HistoryError>;
    async fn update(&self, execution_id: Uuid, patch: SnapshotPatch) -> Result<(), HistoryError>;
    async fn query(&self, filter: HistoryFilter, paging: Paging) -> Result<Vec<ExecutionSnapshot>, HistoryError>;
    async fn aggregate(&self, filter: HistoryFilter) -> Result<AggregateResult, HistoryError>;
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, HistoryError>;
}
