//! Core domain models for the workflow engine.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory, and serialize to/from the JSONB `definition` column of the
//! `workflows` table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use conditions::{ConditionGroup, FilterRule};
use history::ActionResult;
use retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// How a workflow is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Webhook {
        /// URL path segment that identifies this workflow, or the event tag
        /// this trigger matches (e.g. `"pull_request.opened"`).
        event: String,
        #[serde(default)]
        repository: Option<String>,
        #[serde(default)]
        filters: Vec<FilterRule>,
    },
    Schedule {
        cron: String,
        #[serde(default)]
        timezone: Option<String>,
    },
    Manual,
    Api {
        event: String,
    },
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    Stop,
    Continue,
    Retry,
    Rollback,
    Escalate,
}

impl Default for OnError {
    fn default() -> Self {
        Self::Stop
    }
}

/// A single step in the workflow's action graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Stable identifier, unique within the workflow. Auto-generated at
    /// registration time if absent from the source document.
    pub id: String,
    /// Maps to a registered `ActionExecutor` type tag.
    pub action_type: String,
    pub name: String,
    /// Parameter mapping; string leaves may contain `{{…}}` templates.
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub condition: Option<ConditionGroup>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub on_error: OnError,
    #[serde(default)]
    pub run_async: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

// ---------------------------------------------------------------------------
// WorkflowDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandling {
    #[serde(default)]
    pub default_on_error: OnError,
    #[serde(default)]
    pub notify: Option<String>,
}

/// A complete, immutable (once registered) workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub root_condition: Option<ConditionGroup>,
    pub actions: Vec<ActionConfig>,
    #[serde(default)]
    pub error_handling: Option<ErrorHandling>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    pub created_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, trigger: Trigger, actions: Vec<ActionConfig>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            version: None,
            enabled: true,
            trigger,
            root_condition: None,
            actions,
            error_handling: None,
            timeout_seconds: None,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutionContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSnapshot {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

/// Per-execution state, mutable only via the engine. `previous_actions`
/// grows append-only and reflects only finalized results.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workflow_id: Uuid,
    pub workflow_name: String,
    pub execution_id: Uuid,
    pub trigger: TriggerSnapshot,
    pub repository: Value,
    pub variables: Value,
    /// Never exposed to templates or persisted snapshots.
    pub secrets: HashMap<String, String>,
    pub started_at: DateTime<Utc>,
    pub previous_actions: Vec<ActionResult>,
}

impl ExecutionContext {
    /// Builds the `Value` bundle templates are resolved against. Secrets
    /// are deliberately excluded.
    pub fn template_variables(&self, at: DateTime<Utc>) -> Value {
        let bundle = templates::VariableBundle {
            workflow: serde_json::json!({ "id": self.workflow_id, "name": self.workflow_name }),
            trigger: serde_json::json!({
                "event": self.trigger.event,
                "timestamp": self.trigger.timestamp,
                "payload": self.trigger.payload,
            }),
            repository: self.repository.clone(),
            execution: serde_json::json!({
                "id": self.execution_id,
                "startedAt": self.started_at,
                "duration": at.signed_duration_since(self.started_at).num_milliseconds().max(0),
                "previousActions": self.previous_actions.iter().map(|a| serde_json::json!({
                    "actionId": a.action_id,
                    "status": a.status,
                    "output": a.output,
                })).collect::<Vec<_>>(),
            }),
            variables: self.variables.clone(),
        };
        bundle.into_value(at)
    }
}
