//! The pure retry decision function.

use std::time::Duration;

use rand::Rng;

use crate::models::{
    BackoffStrategy, DenyReason, RetryDecision, RetryPolicy, CIRCUIT_BREAKER_THRESHOLD,
    DELAY_CEILING, DELAY_FLOOR,
};

/// Decide whether attempt `attempt` (0-indexed, the attempt that just
/// failed) should be retried, given `policy`, the failed error's kind, and
/// how many recent failures of this action type fall within the circuit
/// breaker's window.
///
/// Pure function of its arguments; callers are responsible for tracking
/// `recent_failure_count` themselves (see [`crate::tracker`]).
pub fn decide(
    policy: Option<&RetryPolicy>,
    error_kind: &str,
    attempt: u32,
    recent_failure_count: usize,
) -> RetryDecision {
    let Some(policy) = policy else {
        return RetryDecision::Deny { reason: DenyReason::NoPolicy };
    };

    if attempt + 1 >= policy.max_attempts {
        return RetryDecision::Deny { reason: DenyReason::AttemptsExhausted };
    }

    if let Some(allowed) = &policy.retry_on {
        if !allowed.iter().any(|k| k == error_kind) {
            return RetryDecision::Deny { reason: DenyReason::ErrorKindNotRetryable };
        }
    }

    if recent_failure_count >= CIRCUIT_BREAKER_THRESHOLD {
        return RetryDecision::Deny { reason: DenyReason::CircuitOpen };
    }

    let delay = compute_delay(policy, attempt);

    if delay > DELAY_CEILING {
        return RetryDecision::Deny { reason: DenyReason::DelayExceedsCeiling };
    }

    RetryDecision::Retry { delay: delay.max(DELAY_FLOOR) }
}

fn compute_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy.delay.max(0.0);

    let seconds = match policy.backoff {
        BackoffStrategy::Fixed => base,
        BackoffStrategy::Linear => base * (attempt as f64 + 1.0),
        BackoffStrategy::Exponential => {
            let raw = base * 2f64.powi(attempt as i32);
            let jitter_ratio = rand::thread_rng().gen_range(-0.25..=0.25);
            raw + raw * jitter_ratio
        }
    };

    Duration::from_secs_f64(seconds.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32, delay: f64, backoff: BackoffStrategy) -> RetryPolicy {
        RetryPolicy { max_attempts, delay, backoff, retry_on: None }
    }

    #[test]
    fn no_policy_denies() {
        assert_eq!(decide(None, "timeout", 0, 0), RetryDecision::Deny { reason: DenyReason::NoPolicy });
    }

    #[test]
    fn attempts_exhausted_denies() {
        let p = policy(3, 1.0, BackoffStrategy::Fixed);
        // max_attempts=3 allows invocations for attempt 0 and 1 to retry; the
        // attempt that just ran as attempt 2 is the 3rd invocation and must
        // not be retried, so at most 3 invocations ever happen.
        assert!(matches!(decide(Some(&p), "timeout", 1, 0), RetryDecision::Retry { .. }));
        assert_eq!(
            decide(Some(&p), "timeout", 2, 0),
            RetryDecision::Deny { reason: DenyReason::AttemptsExhausted }
        );
    }

    #[test]
    fn retry_on_allow_list_filters_error_kind() {
        let mut p = policy(3, 1.0, BackoffStrategy::Fixed);
        p.retry_on = Some(vec!["timeout".into()]);
        assert_eq!(
            decide(Some(&p), "validation", 0, 0),
            RetryDecision::Deny { reason: DenyReason::ErrorKindNotRetryable }
        );
        assert!(matches!(decide(Some(&p), "timeout", 0, 0), RetryDecision::Retry { .. }));
    }

    #[test]
    fn circuit_breaker_denies_at_threshold() {
        let p = policy(10, 1.0, BackoffStrategy::Fixed);
        assert_eq!(
            decide(Some(&p), "timeout", 0, 5),
            RetryDecision::Deny { reason: DenyReason::CircuitOpen }
        );
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let p = policy(5, 2.0, BackoffStrategy::Fixed);
        for attempt in 0..3 {
            let RetryDecision::Retry { delay } = decide(Some(&p), "x", attempt, 0) else {
                panic!("expected retry");
            };
            assert_eq!(delay, Duration::from_secs_f64(2.0));
        }
    }

    #[test]
    fn linear_backoff_scales_with_attempt() {
        let p = policy(5, 1.0, BackoffStrategy::Linear);
        let RetryDecision::Retry { delay } = decide(Some(&p), "x", 2, 0) else { panic!() };
        assert_eq!(delay, Duration::from_secs_f64(3.0));
    }

    #[test]
    fn exponential_backoff_within_jitter_tolerance() {
        let p = policy(5, 1.0, BackoffStrategy::Exponential);
        let RetryDecision::Retry { delay } = decide(Some(&p), "x", 1, 0) else { panic!() };
        // base * 2^1 = 2.0s, +/-25% jitter => [1.5, 2.5]
        assert!(delay.as_secs_f64() >= 1.5 && delay.as_secs_f64() <= 2.5);
    }

    #[test]
    fn delay_exceeding_ceiling_denies() {
        let p = policy(20, 1000.0, BackoffStrategy::Exponential);
        assert_eq!(
            decide(Some(&p), "x", 10, 0),
            RetryDecision::Deny { reason: DenyReason::DelayExceedsCeiling }
        );
    }

    #[test]
    fn delay_floor_is_enforced() {
        let p = policy(5, 0.0, BackoffStrategy::Fixed);
        let RetryDecision::Retry { delay } = decide(Some(&p), "x", 0, 0) else { panic!() };
        assert_eq!(delay, DELAY_FLOOR);
    }
}
