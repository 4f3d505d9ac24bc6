//! `retry` crate — backoff decisions and circuit breaking for action
//! execution (C5).

pub mod decision;
pub mod models;
pub mod tracker;

pub use decision::decide;
pub use models::{
    BackoffStrategy, DenyReason, RetryDecision, RetryPolicy, CIRCUIT_BREAKER_THRESHOLD,
    CIRCUIT_BREAKER_WINDOW, DELAY_CEILING, DELAY_FLOOR,
};
pub use tracker::{CircuitBreaker, ExecutionRetryHistory, RetryStatistics};
