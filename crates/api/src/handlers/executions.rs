use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use engine::{TriggerSnapshot, WorkflowDefinition};
use serde_json::Value;
use uuid::Uuid;

use super::AppState;
use db::repository::workflows as wf_repo;

#[derive(serde::Deserialize, Default)]
pub struct ExecuteWorkflowDto {
    #[serde(default)]
    pub variables: Value,
    #[serde(default)]
    pub repository: Value,
}

/// `POST /api/v1/workflows/:id/execute` — runs the workflow synchronously
/// against a `manual` trigger and returns the finished `ExecutionResult`.
/// Webhook-triggered runs never go through this path; they flow through
/// C9's ingress → C7 queue → worker instead.
pub async fn execute(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteWorkflowDto>,
) -> Result<Json<engine::ExecutionResult>, StatusCode> {
    let row = match wf_repo::get_workflow(&state.pool, id).await {
        Ok(row) => row,
        Err(db::DbError::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let definition: WorkflowDefinition = serde_json::from_value(row.definition).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let trigger = TriggerSnapshot { event: "manual".to_string(), timestamp: Utc::now(), payload: Value::Null };

    let result = state
        .executor
        .run(&definition, trigger, payload.repository, payload.variables, HashMap::new(), None)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(result))
}
