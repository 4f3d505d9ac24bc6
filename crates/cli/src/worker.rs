//! The queue worker: pops webhook events off C7 and runs every enabled
//! workflow whose trigger matches the event, through C6.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use conditions::{ConditionGroup, ConditionNode, LogicalOperator};
use engine::{Trigger, TriggerSnapshot, WorkflowDefinition, WorkflowExecutor};
use queue::{Processor, ProcessorOutcome, ProcessorRegistry, QueuedEvent};
use regex::Regex;
use serde_json::{json, Value};

pub struct WorkflowDispatchProcessor {
    pool: db::DbPool,
    executor: Arc<WorkflowExecutor>,
}

impl WorkflowDispatchProcessor {
    pub fn new(pool: db::DbPool, executor: Arc<WorkflowExecutor>) -> Self {
        Self { pool, executor }
    }
}

#[async_trait]
impl Processor for WorkflowDispatchProcessor {
    async fn process(&self, event: &QueuedEvent) -> ProcessorOutcome {
        let rows = match db::repository::workflows::list_workflows(&self.pool).await {
            Ok(rows) => rows,
            Err(err) => return ProcessorOutcome::Retryable(err.to_string()),
        };

        let matched: Vec<WorkflowDefinition> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<WorkflowDefinition>(row.definition).ok())
            .filter(|wf| wf.enabled && matches_trigger(&wf.trigger, event))
            .collect();

        if matched.is_empty() {
            tracing::debug!(event_type = %event.event_type, delivery_id = %event.delivery_id, "no workflow matched event");
            return ProcessorOutcome::Success;
        }

        for workflow in matched {
            let trigger = TriggerSnapshot { event: event.event_type.clone(), timestamp: event.enqueued_at, payload: event.payload.clone() };
            let repository = event.payload.get("repository").cloned().unwrap_or(Value::Null);

            if let Err(err) = self
                .executor
                .run(&workflow, trigger, repository, Value::Null, HashMap::new(), None)
                .await
            {
                tracing::error!(workflow = %workflow.name, delivery_id = %event.delivery_id, error = %err, "workflow execution failed");
                return ProcessorOutcome::Retryable(err.to_string());
            }
        }

        ProcessorOutcome::Success
    }
}

fn matches_trigger(trigger: &Trigger, event: &QueuedEvent) -> bool {
    let Trigger::Webhook { event: expected_event, repository, filters } = trigger else {
        return false;
    };

    if expected_event != &event.event_type {
        return false;
    }

    if let Some(pattern) = repository {
        let full_name = event.payload.get("repository").and_then(|r| r.get("full_name")).and_then(Value::as_str).unwrap_or("");
        if !glob_match(pattern, full_name) {
            return false;
        }
    }

    if filters.is_empty() {
        return true;
    }

    let group = ConditionGroup {
        operator: LogicalOperator::And,
        rules: filters.iter().cloned().map(ConditionNode::Rule).collect::<Vec<_>>(),
    };
    let context = json!({ "payload": event.payload });
    conditions::evaluate_group(&group, &context).unwrap_or(false)
}

/// A small `*`-wildcard glob, anchored at both ends — enough for repository
/// patterns like `my-org/*`.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let escaped = regex::escape(pattern).replace("\\*", ".*");
    Regex::new(&format!("^{escaped}$")).map(|re| re.is_match(candidate)).unwrap_or(false)
}

/// Registers the dispatch processor under every distinct webhook event tag
/// currently in use by an enabled workflow. Workflows registered after the
/// worker starts with a previously-unseen event tag require a restart to
/// pick up — the registry is populated once at startup, matching the
/// read-mostly registry policy the rest of the system uses.
pub async fn register_processors(pool: &db::DbPool, processors: &ProcessorRegistry, dispatcher: Arc<WorkflowDispatchProcessor>) {
    let rows = match db::repository::workflows::list_workflows(pool).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(error = %err, "failed to load workflows while registering processors");
            return;
        }
    };

    let mut seen: HashSet<String> = HashSet::new();
    for row in rows {
        let Ok(wf) = serde_json::from_value::<WorkflowDefinition>(row.definition) else { continue };
        if let Trigger::Webhook { event, .. } = wf.trigger {
            if seen.insert(event.clone()) {
                processors.register(event, Arc::clone(&dispatcher) as Arc<dyn Processor>);
            }
        }
    }

    if processors.is_empty() {
        tracing::warn!("no webhook-triggered workflows found; worker has nothing registered");
    }
}

