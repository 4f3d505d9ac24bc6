//! The per-execution orchestrator (C6): stage scheduling, condition gating,
//! templating, retries, and history recording, all tied together.
//!
//! A stage-by-stage engine where each action carries its own condition,
//! template parameters, and retry policy.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use conditions::evaluate_group;
use futures::stream::{FuturesUnordered, StreamExt};
use history::{ActionResult, ActionStatus, ExecutionHistory, ExecutionSnapshot, ExecutionStatus};
use nodes::ActionExecutorRegistry;
use retry::{CircuitBreaker, ExecutionRetryHistory, RetryDecision};
use serde_json::Value;
use templates::{TemplateMode, TemplateOptions};
use uuid::Uuid;

use crate::dag::build_stage_plan;
use crate::events::{EventReceiver, EventSender, ExecutionEvent};
use crate::models::{ActionConfig, ExecutionContext, OnError, TriggerSnapshot, WorkflowDefinition};
use crate::validation::validate_workflow;
use crate::EngineError;

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub default_execution_timeout: Duration,
    pub default_action_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { default_execution_timeout: Duration::from_secs(300), default_action_timeout: Duration::from_secs(300) }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
    pub action_results: Vec<ActionResult>,
    pub metrics: Value,
}

/// Stateless-per-call orchestrator; construct one per process and call
/// [`WorkflowExecutor::run`] for each triggered execution.
pub struct WorkflowExecutor {
    registry: Arc<ActionExecutorRegistry>,
    history: Arc<ExecutionHistory>,
    config: ExecutorConfig,
    events: EventSender,
    cancelled: Mutex<HashSet<Uuid>>,
    /// Shared across every execution this process runs, keyed by action
    /// type — see `retry::CircuitBreaker`.
    circuit_breaker: CircuitBreaker,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<ActionExecutorRegistry>, history: Arc<ExecutionHistory>, config: ExecutorConfig) -> Self {
        let (events, _) = tokio::sync::broadcast::channel(256);
        Self { registry, history, config, events, cancelled: Mutex::new(HashSet::new()), circuit_breaker: CircuitBreaker::new() }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Marks a running execution cancelled. In-flight action calls are not
    /// forcibly aborted; their eventual results are discarded once the
    /// execution no longer appears in the active map.
    pub fn cancel(&self, execution_id: Uuid) {
        self.cancelled.lock().expect("cancelled-set mutex poisoned").insert(execution_id);
    }

    fn is_cancelled(&self, execution_id: Uuid) -> bool {
        self.cancelled.lock().expect("cancelled-set mutex poisoned").contains(&execution_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        workflow: &WorkflowDefinition,
        trigger: TriggerSnapshot,
        repository: Value,
        variables: Value,
        secrets: HashMap<String, String>,
        execution_id: Option<Uuid>,
    ) -> Result<ExecutionResult, EngineError> {
        validate_workflow(workflow)?;

        let execution_id = execution_id.unwrap_or_else(Uuid::new_v4);
        let started_at = Utc::now();

        let mut ctx = ExecutionContext {
            workflow_id: workflow.id,
            workflow_name: workflow.name.clone(),
            execution_id,
            trigger,
            repository,
            variables,
            secrets,
            started_at,
            previous_actions: Vec::new(),
        };

        if let Some(root_condition) = &workflow.root_condition {
            let condition_ctx = condition_context(&ctx);
            if !evaluate_group(root_condition, &condition_ctx)? {
                let snapshot = ExecutionSnapshot::new(execution_id, workflow.name.clone(), started_at, workflow.actions.len(), Value::Null);
                self.history.start(snapshot).await;
                self.history.finish(execution_id, ExecutionStatus::Completed, Utc::now(), None).await;
                return Ok(ExecutionResult { execution_id, status: ExecutionStatus::Completed, action_results: vec![], metrics: Value::Null });
            }
        }

        let snapshot = ExecutionSnapshot::new(execution_id, workflow.name.clone(), started_at, workflow.actions.len(), Value::Null);
        self.history.start(snapshot).await;
        let _ = self.events.send(ExecutionEvent::Started { execution_id });

        let total_timeout = workflow.timeout_seconds.map(Duration::from_secs).unwrap_or(self.config.default_execution_timeout);

        let retry_history = ExecutionRetryHistory::new();
        let stage_plan = build_stage_plan(workflow)?;
        let by_id: HashMap<&str, &ActionConfig> = workflow.actions.iter().map(|a| (a.id.as_str(), a)).collect();

        let outcome = tokio::time::timeout(total_timeout, self.run_stages(&stage_plan, &by_id, &mut ctx, &retry_history)).await;

        let (status, error) = match outcome {
            Err(_) => (ExecutionStatus::Timeout, Some("execution exceeded its total timeout".to_string())),
            Ok(Err(stop_reason)) => (ExecutionStatus::Failed, Some(stop_reason)),
            Ok(Ok(())) => {
                if self.is_cancelled(execution_id) {
                    (ExecutionStatus::Cancelled, None)
                } else {
                    (ExecutionStatus::Completed, None)
                }
            }
        };

        let ended_at = Utc::now();
        self.history.finish(execution_id, status, ended_at, error.clone()).await;

        let event = match status {
            ExecutionStatus::Completed => ExecutionEvent::Completed { execution_id },
            ExecutionStatus::Failed => ExecutionEvent::Failed { execution_id, error: error.clone().unwrap_or_default() },
            ExecutionStatus::Timeout => ExecutionEvent::Timeout { execution_id },
            ExecutionStatus::Cancelled => ExecutionEvent::Cancelled { execution_id },
            ExecutionStatus::Running => unreachable!("run() only produces terminal statuses"),
        };
        let _ = self.events.send(event);

        let metrics = serde_json::json!({
            "actionCount": workflow.actions.len(),
            "stageCount": stage_plan.len(),
            "retryStatistics": retry_stats_to_json(&retry_history),
            "actionMetrics": action_metrics_to_json(&ctx.previous_actions),
        });

        Ok(ExecutionResult { execution_id, status, action_results: ctx.previous_actions, metrics })
    }

    /// Runs every stage in order. Returns `Err(reason)` if a stop-triggering
    /// failure occurred; the stage loop still finishes the current stage's
    /// in-flight work before surfacing it.
    async fn run_stages(
        &self,
        stage_plan: &[Vec<String>],
        by_id: &HashMap<&str, &ActionConfig>,
        ctx: &mut ExecutionContext,
        retry_history: &ExecutionRetryHistory,
    ) -> Result<(), String> {
        for stage in stage_plan {
            if self.is_cancelled(ctx.execution_id) {
                return Ok(());
            }

            let (sync_ids, async_ids): (Vec<&String>, Vec<&String>) = stage.iter().partition(|id| !by_id[id.as_str()].run_async);
            let mut stop_reason: Option<String> = None;

            for id in sync_ids {
                let action = by_id[id.as_str()];
                let result = self.run_action(action, ctx, retry_history).await;
                if stop_reason.is_none() && action_triggers_stop(action, &result) {
                    stop_reason = Some(format!("action '{id}' failed with onError={:?}", action.on_error));
                }
                ctx.previous_actions.push(result);
            }

            if stop_reason.is_none() && !async_ids.is_empty() {
                let ctx_ref: &ExecutionContext = ctx;
                let mut in_flight: FuturesUnordered<_> = async_ids
                    .iter()
                    .map(|id| {
                        let action = by_id[id.as_str()];
                        async move { (action, self.run_action(action, ctx_ref, retry_history).await) }
                    })
                    .collect();

                // `previous_actions` must reflect completion order for actions in
                // the same stage, so results are collected as each future resolves
                // rather than in the order the futures were started.
                let mut completed: Vec<ActionResult> = Vec::with_capacity(async_ids.len());
                while let Some((action, result)) = in_flight.next().await {
                    if stop_reason.is_none() && action_triggers_stop(action, &result) {
                        stop_reason = Some(format!("action '{}' failed with onError={:?}", action.id, action.on_error));
                    }
                    completed.push(result);
                }
                ctx.previous_actions.extend(completed);
            }

            for result in ctx.previous_actions.iter().filter(|r| stage.contains(&r.action_id)) {
                self.history.record_action_result(ctx.execution_id, result.clone()).await;
            }

            if let Some(reason) = stop_reason {
                return Err(reason);
            }
        }
        Ok(())
    }

    async fn run_action(&self, action: &ActionConfig, ctx: &ExecutionContext, retry_history: &ExecutionRetryHistory) -> ActionResult {
        let mut result = ActionResult::pending(action.id.clone(), action.action_type.clone());
        result.status = ActionStatus::Running;
        result.started_at = Some(Utc::now());

        if let Some(condition) = &action.condition {
            let condition_ctx = condition_context(ctx);
            match evaluate_group(condition, &condition_ctx) {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    result.status = ActionStatus::Skipped;
                    result.ended_at = Some(Utc::now());
                    return result;
                }
            }
        }

        let variables = ctx.template_variables(Utc::now());
        let template_options = TemplateOptions { mode: TemplateMode::Strict, ..Default::default() };
        let resolved_params = match templates::resolve(&action.params, &variables, &template_options) {
            Ok(value) => value,
            Err(err) => {
                result.status = ActionStatus::Failed;
                result.error = Some(format!("template error: {err}"));
                result.ended_at = Some(Utc::now());
                return result;
            }
        };

        let action_timeout = action.timeout_seconds.map(Duration::from_secs).unwrap_or(self.config.default_action_timeout);

        let node_ctx = nodes::ExecutionContext {
            workflow_id: ctx.workflow_id,
            execution_id: ctx.execution_id,
            input: resolved_params.clone(),
            secrets: ctx.secrets.clone(),
        };

        let mut attempt: u32 = 0;
        loop {
            let call = self.registry.execute(&action.action_type, resolved_params.clone(), &node_ctx);
            match tokio::time::timeout(action_timeout, call).await {
                Err(_) => {
                    result.status = ActionStatus::Failed;
                    result.error = Some(format!("action '{}' exceeded its timeout", action.id));
                    result.retry_count = attempt;
                    break;
                }
                Ok(Ok(value)) => {
                    result.status = ActionStatus::Completed;
                    result.output = Some(value);
                    result.retry_count = attempt;
                    retry_history.record_success(&action.id, &action.action_type, Utc::now(), &self.circuit_breaker);
                    break;
                }
                Ok(Err(nodes::NodeError::Fatal(message))) => {
                    result.status = ActionStatus::Failed;
                    result.error = Some(message);
                    result.retry_count = attempt;
                    break;
                }
                Ok(Err(nodes::NodeError::Retryable(message))) => {
                    let decision = retry_history.record_and_decide(
                        &action.id,
                        &action.action_type,
                        action.retry_policy.as_ref(),
                        &message,
                        attempt,
                        Utc::now(),
                        &self.circuit_breaker,
                    );
                    match decision {
                        RetryDecision::Retry { delay } => {
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        RetryDecision::Deny { .. } => {
                            result.status = ActionStatus::Failed;
                            result.error = Some(message);
                            result.retry_count = attempt;
                            break;
                        }
                    }
                }
            }
        }

        result.ended_at = Some(Utc::now());
        result
    }
}

fn action_triggers_stop(action: &ActionConfig, result: &ActionResult) -> bool {
    result.status == ActionStatus::Failed && action.on_error != OnError::Continue
}

/// The evaluation context conditions run against: the template variable
/// bundle, enriched with `sender`/`installation` lifted to the top level
/// when present on the trigger payload (GitHub-style webhook shape).
fn condition_context(ctx: &ExecutionContext) -> Value {
    let mut variables = ctx.template_variables(Utc::now());
    if let Some(obj) = variables.as_object_mut() {
        if let Some(sender) = ctx.trigger.payload.get("sender") {
            obj.insert("sender".to_string(), sender.clone());
        }
        if let Some(installation) = ctx.trigger.payload.get("installation") {
            obj.insert("installation".to_string(), installation.clone());
        }
    }
    variables
}

/// Summarizes `totalActions`/successful/failed/skipped/retried counts plus
/// average/longest/shortest action durations for one execution's actions.
fn action_metrics_to_json(results: &[ActionResult]) -> Value {
    let total = results.len();
    let successful = results.iter().filter(|r| r.status == ActionStatus::Completed).count();
    let failed = results.iter().filter(|r| r.status == ActionStatus::Failed).count();
    let skipped = results.iter().filter(|r| r.status == ActionStatus::Skipped).count();
    let retried = results.iter().filter(|r| r.retry_count > 0).count();

    let durations_ms: Vec<i64> = results
        .iter()
        .filter_map(|r| Some((r.started_at?, r.ended_at?)))
        .map(|(started, ended)| ended.signed_duration_since(started).num_milliseconds().max(0))
        .collect();

    let (average_ms, longest_ms, shortest_ms) = if durations_ms.is_empty() {
        (0, 0, 0)
    } else {
        let sum: i64 = durations_ms.iter().sum();
        (sum / durations_ms.len() as i64, *durations_ms.iter().max().unwrap(), *durations_ms.iter().min().unwrap())
    };

    serde_json::json!({
        "totalActions": total,
        "successful": successful,
        "failed": failed,
        "skipped": skipped,
        "retried": retried,
        "averageDurationMs": average_ms,
        "longestDurationMs": longest_ms,
        "shortestDurationMs": shortest_ms,
    })
}

fn retry_stats_to_json(history: &ExecutionRetryHistory) -> Value {
    let stats = history.statistics();
    serde_json::json!({
        "totalAttempts": stats.total_attempts,
        "totalRetries": stats.total_retries,
        "actionsRecovered": stats.actions_recovered,
        "actionsExhausted": stats.actions_exhausted,
    })
}
