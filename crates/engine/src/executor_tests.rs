//! Integration tests for the workflow execution engine, exercising
//! `WorkflowExecutor::run` end-to-end against `MockNode` action handlers and
//! an in-memory `HistoryStore`, so no real Postgres connection is required.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use history::{AggregateResult, ExecutionHistory, ExecutionSnapshot, ExecutionStatus, HistoryError, HistoryFilter, HistoryStore, Paging, SnapshotPatch};
use nodes::mock::MockNode;
use nodes::ActionExecutorRegistry;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{ActionConfig, OnError, Trigger, TriggerSnapshot, WorkflowDefinition};
use crate::executor::{ExecutorConfig, WorkflowExecutor};

#[derive(Default)]
struct InMemoryStore;

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn create(&self, _snapshot: &ExecutionSnapshot) -> Result<(), HistoryError> {
        Ok(())
    }
    async fn update(&self, _execution_id: Uuid, _patch: SnapshotPatch) -> Result<(), HistoryError> {
        Ok(())
    }
    async fn query(&self, _filter: HistoryFilter, _paging: Paging) -> Result<Vec<ExecutionSnapshot>, HistoryError> {
        Ok(vec![])
    }
    async fn aggregate(&self, _filter: HistoryFilter) -> Result<AggregateResult, HistoryError> {
        Ok(AggregateResult::default())
    }
    async fn delete_older_than(&self, _cutoff: chrono::DateTime<Utc>) -> Result<u64, HistoryError> {
        Ok(0)
    }
}

fn action(id: &str, action_type: &str, depends_on: &[&str], on_error: OnError) -> ActionConfig {
    ActionConfig {
        id: id.to_string(),
        action_type: action_type.to_string(),
        name: id.to_string(),
        params: json!({ "id": id }),
        condition: None,
        timeout_seconds: None,
        retry_policy: None,
        on_error,
        run_async: false,
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
    }
}

fn workflow(actions: Vec<ActionConfig>) -> WorkflowDefinition {
    WorkflowDefinition::new("test-workflow", Trigger::Manual, actions)
}

fn trigger() -> TriggerSnapshot {
    TriggerSnapshot { event: "manual".into(), timestamp: Utc::now(), payload: Value::Null }
}

fn executor(registry: Arc<ActionExecutorRegistry>) -> WorkflowExecutor {
    let history = Arc::new(ExecutionHistory::new(Arc::new(InMemoryStore), 100));
    WorkflowExecutor::new(registry, history, ExecutorConfig::default())
}

#[tokio::test]
async fn linear_workflow_runs_actions_in_dependency_order() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    registry.register("mock", Arc::new(MockNode::returning("mock", json!({ "ok": true }))));

    let wf = workflow(vec![
        action("a", "mock", &[], OnError::Stop),
        action("b", "mock", &["a"], OnError::Stop),
        action("c", "mock", &["b"], OnError::Stop),
    ]);

    let result = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    let order: Vec<&str> = result.action_results.iter().map(|r| r.action_id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn independent_actions_in_the_same_stage_both_complete() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    registry.register("mock", Arc::new(MockNode::returning("mock", json!({ "ok": true }))));

    let wf = workflow(vec![
        action("a", "mock", &[], OnError::Stop),
        action("b", "mock", &[], OnError::Stop),
    ]);

    let result = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.action_results.len(), 2);
}

#[tokio::test]
async fn fatal_action_with_stop_fails_the_execution_and_skips_later_stages() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    registry.register("boom", Arc::new(MockNode::failing_fatal("boom", "unrecoverable")));
    registry.register("mock", Arc::new(MockNode::returning("mock", json!({ "ok": true }))));

    let wf = workflow(vec![
        action("a", "boom", &[], OnError::Stop),
        action("b", "mock", &["a"], OnError::Stop),
    ]);

    let result = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.action_results.len(), 1);
    assert_eq!(result.action_results[0].action_id, "a");
}

#[tokio::test]
async fn fatal_action_with_continue_lets_later_stages_run() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    registry.register("boom", Arc::new(MockNode::failing_fatal("boom", "unrecoverable")));
    registry.register("mock", Arc::new(MockNode::returning("mock", json!({ "ok": true }))));

    let wf = workflow(vec![action("a", "boom", &[], OnError::Continue), action("b", "mock", &[], OnError::Stop)]);

    let result = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.action_results.len(), 2);
}

#[tokio::test]
async fn retryable_action_eventually_exhausts_and_fails() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    registry.register("flaky", Arc::new(MockNode::failing_retryable("flaky", "transient")));

    let mut a = action("a", "flaky", &[], OnError::Stop);
    a.retry_policy = Some(retry::RetryPolicy { max_attempts: 2, delay: 0.001, backoff: retry::BackoffStrategy::Fixed, retry_on: None });
    let wf = workflow(vec![a]);

    let result = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.action_results[0].retry_count, 1);
}

#[tokio::test]
async fn false_condition_skips_the_action() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    registry.register("mock", Arc::new(MockNode::returning("mock", json!({ "ok": true }))));

    let mut a = action("a", "mock", &[], OnError::Stop);
    a.condition = Some(conditions::ConditionGroup {
        operator: conditions::LogicalOperator::And,
        rules: vec![conditions::ConditionNode::Rule(conditions::FilterRule {
            field: "trigger.payload.shouldRun".into(),
            operator: conditions::Operator::Equals,
            value: json!(true),
        })],
    });
    let wf = workflow(vec![a]);

    let result = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap();

    assert_eq!(result.action_results[0].status, history::ActionStatus::Skipped);
}

#[tokio::test]
async fn unsupported_action_type_is_rejected_before_execution() {
    let registry = Arc::new(ActionExecutorRegistry::new());
    let wf = workflow(vec![action("a", "conditional", &[], OnError::Stop)]);

    let err = executor(registry).run(&wf, trigger(), Value::Null, Value::Null, HashMap::new(), None).await.unwrap_err();
    assert!(matches!(err, crate::EngineError::UnsupportedActionType { .. }));
}
