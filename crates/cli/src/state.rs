//! Assembles the shared `api::AppState` (and the pieces the worker needs
//! beyond it) from a `Config`, once per process.

use std::sync::Arc;

use dedup::DedupCache;
use engine::WorkflowExecutor;
use history::ExecutionHistory;
use nodes::ActionExecutorRegistry;
use queue::{EventQueue, ProcessorRegistry};

use crate::config::Config;

pub struct Shared {
    pub state: api::AppState,
}

pub async fn build(config: &Config) -> Shared {
    let pool = db::pool::create_pool(&config.database_url, 10).await.expect("failed to connect to database");

    let registry = Arc::new(ActionExecutorRegistry::with_builtins());
    let store = Arc::new(db::PostgresHistoryStore::new(pool.clone()));
    let history = Arc::new(ExecutionHistory::new(store, config.history_cache_capacity));
    let executor = Arc::new(WorkflowExecutor::new(Arc::clone(&registry), Arc::clone(&history), config.executor_config()));

    let queue = Arc::new(EventQueue::new(config.queue_config()));
    let dedup = Arc::new(DedupCache::new(config.dedup_config()));
    let processors = Arc::new(ProcessorRegistry::new());

    let state = api::AppState {
        pool,
        registry,
        history,
        executor,
        queue,
        processors,
        dedup,
        webhook_secret: config.webhook_secret.clone(),
        queue_max_retries: config.queue_max_retries,
    };

    Shared { state }
}
