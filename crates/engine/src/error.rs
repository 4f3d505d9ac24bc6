//! Engine-level error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema/business-rule validation failure, reported with a path and code
/// so callers can render it next to the offending field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub code: String,
}

/// Errors produced by the workflow engine (validation + execution).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Schema or business-rule validation failed; registration is atomic —
    /// either every issue is reported and nothing is registered, or the
    /// workflow is accepted.
    #[error("workflow validation failed: {0:?}")]
    Validation(Vec<ValidationIssue>),

    /// Two or more actions share the same ID.
    #[error("duplicate action ID: '{0}'")]
    DuplicateActionId(String),

    /// `dependsOn` references an action ID that doesn't exist in the workflow.
    #[error("action '{action_id}' depends on unknown action '{dependency}'")]
    UnknownDependency { action_id: String, dependency: String },

    /// Topological layering detected a cycle.
    #[error("workflow action graph contains a cycle")]
    CycleDetected,

    /// An action declares an unsupported type (`conditional`/`loop`).
    #[error("action '{action_id}' has unsupported type: {source}")]
    UnsupportedActionType { action_id: String, #[source] source: nodes::ActionTypeError },

    /// The trigger's or workflow's root condition failed to evaluate; fatal
    /// to the execution (unlike an action-level condition error, which only
    /// skips that action).
    #[error("root condition evaluation failed: {0}")]
    ConditionEvaluation(#[from] conditions::ConditionError),

    /// A action failed with a fatal error or exhausted its retries; the
    /// whole execution is aborted (subject to `onError`).
    #[error("action '{action_id}' failed fatally: {message}")]
    ActionFatal { action_id: String, message: String },

    /// Total-execution timeout fired while actions were still in flight.
    #[error("execution exceeded its total timeout")]
    ExecutionTimeout,

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),
}
