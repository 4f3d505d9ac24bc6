//! Stateful retry bookkeeping layered on top of the pure [`crate::decision::decide`].
//!
//! In-process state guarded by `std::sync::Mutex`, no external store.
//!
//! Two kinds of state are tracked here, deliberately kept separate:
//! - [`ExecutionRetryHistory`] — per-execution attempt bookkeeping (retry
//!   counts, recovered/exhausted stats), scoped to one `run()` call.
//! - [`CircuitBreaker`] — process-lifetime failure counts keyed by action
//!   *type*, shared across every execution, so a chronically-failing action
//!   type actually trips the breaker regardless of which action id or
//!   execution produced the failures.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::decision::decide;
use crate::models::{RetryDecision, RetryPolicy, CIRCUIT_BREAKER_WINDOW};

#[derive(Debug, Clone)]
struct Attempt {
    at: DateTime<Utc>,
    error_kind: String,
    succeeded: bool,
}

/// Retry bookkeeping for a single action id within a single execution.
#[derive(Debug, Default)]
struct ActionRetryContext {
    attempts: Vec<Attempt>,
}

impl ActionRetryContext {
    /// "Success" is a later non-retry completion of this action id within
    /// the same execution — i.e. any attempt recorded as succeeded at all.
    fn has_succeeded(&self) -> bool {
        self.attempts.iter().any(|a| a.succeeded)
    }
}

/// Aggregate retry stats for one execution, suitable for exposing via the
/// history/aggregation surface.
#[derive(Debug, Clone, Default)]
pub struct RetryStatistics {
    pub total_attempts: usize,
    pub total_retries: usize,
    pub actions_recovered: usize,
    pub actions_exhausted: usize,
}

/// Tracks retry attempts across every action id in one workflow execution.
/// Constructed fresh per `run()` call — its counts feed `ExecutionResult`'s
/// metrics and don't need to outlive the execution they describe.
#[derive(Default)]
pub struct ExecutionRetryHistory {
    inner: Mutex<HashMap<String, ActionRetryContext>>,
}

impl ExecutionRetryHistory {
    pub fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    /// Record an attempt's outcome and decide whether a further retry
    /// should happen. `attempt` is the 0-indexed attempt that just ran.
    /// The circuit-breaker check is against `breaker`'s failure count for
    /// `action_type`, not this execution's own history.
    #[allow(clippy::too_many_arguments)]
    pub fn record_and_decide(
        &self,
        action_id: &str,
        action_type: &str,
        policy: Option<&RetryPolicy>,
        error_kind: &str,
        attempt: u32,
        now: DateTime<Utc>,
        breaker: &CircuitBreaker,
    ) -> RetryDecision {
        let mut guard = self.inner.lock().expect("retry history mutex poisoned");
        let ctx = guard.entry(action_id.to_string()).or_default();
        ctx.attempts.push(Attempt { at: now, error_kind: error_kind.to_string(), succeeded: false });
        drop(guard);

        breaker.record_failure(action_type, now);
        let recent_failures = breaker.recent_failure_count(action_type, now);
        decide(policy, error_kind, attempt, recent_failures)
    }

    /// Record that an action id finished without needing further retries.
    pub fn record_success(&self, action_id: &str, action_type: &str, now: DateTime<Utc>, breaker: &CircuitBreaker) {
        let mut guard = self.inner.lock().expect("retry history mutex poisoned");
        let ctx = guard.entry(action_id.to_string()).or_default();
        ctx.attempts.push(Attempt { at: now, error_kind: String::new(), succeeded: true });
        drop(guard);

        breaker.record_success(action_type, now);
    }

    pub fn statistics(&self) -> RetryStatistics {
        let guard = self.inner.lock().expect("retry history mutex poisoned");
        let mut stats = RetryStatistics::default();
        for ctx in guard.values() {
            stats.total_attempts += ctx.attempts.len();
            if ctx.attempts.len() > 1 {
                stats.total_retries += ctx.attempts.len() - 1;
            }
            if ctx.has_succeeded() && ctx.attempts.len() > 1 {
                stats.actions_recovered += 1;
            }
            if !ctx.has_succeeded() && !ctx.attempts.is_empty() {
                stats.actions_exhausted += 1;
            }
        }
        stats
    }
}

/// Process-lifetime circuit breaker, keyed by action type and shared across
/// every workflow execution — construct once per process (see
/// `WorkflowExecutor::new`) and hand a reference to every `run()` call.
#[derive(Default)]
pub struct CircuitBreaker {
    inner: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `action_type` and prune entries outside the
    /// circuit breaker window so memory doesn't grow unbounded over the
    /// life of the process.
    pub fn record_failure(&self, action_type: &str, at: DateTime<Utc>) {
        let mut guard = self.inner.lock().expect("circuit breaker mutex poisoned");
        let failures = guard.entry(action_type.to_string()).or_default();
        failures.push(at);
        failures.retain(|t| at.signed_duration_since(*t).to_std().unwrap_or_default() <= CIRCUIT_BREAKER_WINDOW);
    }

    /// A success doesn't clear recent failures outright — it just lets the
    /// window prune them on the next failure. Still worth pruning here so a
    /// long run of successes frees the now-stale entries promptly.
    pub fn record_success(&self, action_type: &str, at: DateTime<Utc>) {
        let mut guard = self.inner.lock().expect("circuit breaker mutex poisoned");
        if let Some(failures) = guard.get_mut(action_type) {
            failures.retain(|t| at.signed_duration_since(*t).to_std().unwrap_or_default() <= CIRCUIT_BREAKER_WINDOW);
        }
    }

    pub fn recent_failure_count(&self, action_type: &str, at: DateTime<Utc>) -> usize {
        let guard = self.inner.lock().expect("circuit breaker mutex poisoned");
        guard
            .get(action_type)
            .map(|failures| failures.iter().filter(|t| at.signed_duration_since(**t).to_std().unwrap_or_default() <= CIRCUIT_BREAKER_WINDOW).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackoffStrategy, DenyReason};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, delay: 0.1, backoff: BackoffStrategy::Fixed, retry_on: None }
    }

    #[test]
    fn retries_until_exhausted_then_denies() {
        let history = ExecutionRetryHistory::new();
        let breaker = CircuitBreaker::new();
        let p = policy(2);
        let now = Utc::now();

        let d0 = history.record_and_decide("a1", "flaky", Some(&p), "timeout", 0, now, &breaker);
        assert!(matches!(d0, RetryDecision::Retry { .. }));

        let d1 = history.record_and_decide("a1", "flaky", Some(&p), "timeout", 1, now, &breaker);
        assert!(matches!(d1, RetryDecision::Deny { .. }));
    }

    #[test]
    fn success_after_retries_counts_as_recovered() {
        let history = ExecutionRetryHistory::new();
        let breaker = CircuitBreaker::new();
        let p = policy(3);
        let now = Utc::now();

        history.record_and_decide("a1", "flaky", Some(&p), "timeout", 0, now, &breaker);
        history.record_success("a1", "flaky", now, &breaker);

        let stats = history.statistics();
        assert_eq!(stats.actions_recovered, 1);
        assert_eq!(stats.actions_exhausted, 0);
    }

    #[test]
    fn independent_action_ids_dont_share_history() {
        let history = ExecutionRetryHistory::new();
        let breaker = CircuitBreaker::new();
        let p = policy(1);
        let now = Utc::now();

        for _ in 0..5 {
            history.record_and_decide("a1", "flaky", Some(&p), "timeout", 0, now, &breaker);
        }
        let d = history.record_and_decide("a2", "flaky", Some(&p), "timeout", 0, now, &breaker);
        assert!(matches!(d, RetryDecision::Retry { .. } | RetryDecision::Deny { .. }));
    }

    #[test]
    fn circuit_breaker_trips_across_action_ids_sharing_a_type() {
        let breaker = CircuitBreaker::new();
        let now = Utc::now();

        for i in 0..5 {
            breaker.record_failure("http_request", now + chrono::Duration::seconds(i));
        }
        assert_eq!(breaker.recent_failure_count("http_request", now + chrono::Duration::seconds(5)), 5);

        let p = policy(10);
        let decision = decide(Some(&p), "timeout", 0, breaker.recent_failure_count("http_request", now + chrono::Duration::seconds(5)));
        assert!(matches!(decision, RetryDecision::Deny { reason: DenyReason::CircuitOpen }));
    }
}
