//! Retry policy configuration and decision types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    Exponential,
}

/// A workflow action's declared retry behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Base delay, in seconds.
    pub delay: f64,
    pub backoff: BackoffStrategy,
    /// Allow-list of error kinds eligible for retry; `None` means any kind.
    #[serde(default)]
    pub retry_on: Option<Vec<String>>,
}

/// Floor on any computed delay.
pub const DELAY_FLOOR: Duration = Duration::from_millis(100);
/// Ceiling on any computed delay; exceeding it denies the retry outright.
pub const DELAY_CEILING: Duration = Duration::from_secs(5 * 60);
/// Circuit breaker failure-count threshold.
pub const CIRCUIT_BREAKER_THRESHOLD: usize = 5;
/// Circuit breaker sliding window.
pub const CIRCUIT_BREAKER_WINDOW: Duration = Duration::from_secs(5 * 60);

/// The outcome of a retry decision.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Deny { reason: DenyReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    NoPolicy,
    AttemptsExhausted,
    ErrorKindNotRetryable,
    CircuitOpen,
    DelayExceedsCeiling,
}
