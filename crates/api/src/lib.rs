//! `api` crate — HTTP REST API layer.
//!
//! Exposes:
//!   POST   /webhook               (C9 webhook ingress)
//!   GET    /webhook/stats
//!   GET    /webhook/health
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/:id
//!   DELETE /api/v1/workflows/:id
//!   POST   /api/v1/workflows/:id/execute
//!   GET    /api/v1/executions
//!   GET    /api/v1/executions/:id
//!   GET    /api/v1/executions/aggregate

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use db::DbPool;
use dedup::DedupCache;
use engine::WorkflowExecutor;
use history::ExecutionHistory;
use nodes::ActionExecutorRegistry;
use queue::{EventQueue, ProcessorRegistry};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler. Assembled by the `cli` crate from
/// environment configuration, then passed in here rather than built inline,
/// so the same state can back both the HTTP server and the queue worker.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub registry: Arc<ActionExecutorRegistry>,
    pub history: Arc<ExecutionHistory>,
    pub executor: Arc<WorkflowExecutor>,
    pub queue: Arc<EventQueue>,
    pub processors: Arc<ProcessorRegistry>,
    pub dedup: Arc<DedupCache>,
    pub webhook_secret: Option<String>,
    pub queue_max_retries: u32,
}

pub async fn serve(bind: &str, state: AppState) -> Result<(), std::io::Error> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).post(handlers::workflows::create))
        .route("/workflows/:id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:id/execute", post(handlers::executions::execute))
        .route("/executions", get(handlers::history::query))
        .route("/executions/aggregate", get(handlers::history::aggregate))
        .route("/executions/:id", get(handlers::history::get));

    let webhook_router = Router::new()
        .route("/", post(handlers::webhooks::handle_webhook))
        .route("/stats", get(handlers::webhooks::stats))
        .route("/health", get(handlers::webhooks::health));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .nest("/webhook", webhook_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
