//! Read-only execution history endpoints, backed by C10.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use history::{ExecutionSnapshot, HistoryFilter, Paging};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct QueryParams {
    pub workflow_name: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl QueryParams {
    fn filter(&self) -> HistoryFilter {
        HistoryFilter { workflow_name: self.workflow_name.clone(), statuses: None, from: self.from, to: self.to }
    }

    fn paging(&self) -> Paging {
        let mut paging = Paging::default();
        if let Some(offset) = self.offset {
            paging.offset = offset;
        }
        if let Some(limit) = self.limit {
            paging.limit = limit;
        }
        paging
    }
}

pub async fn get(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<ExecutionSnapshot>, StatusCode> {
    match state.history.snapshot(id) {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn query(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExecutionSnapshot>>, StatusCode> {
    state
        .history
        .query(params.filter(), params.paging())
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn aggregate(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<history::AggregateResult>, StatusCode> {
    state.history.aggregate(params.filter()).await.map(Json).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
