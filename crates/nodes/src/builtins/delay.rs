//! The `delay` action: suspends for a configured duration and passes its
//! input through unchanged. One of the handful of suspension points the
//! concurrency model calls out explicitly.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NodeError;
use crate::traits::{ExecutableNode, ExecutionContext};

pub struct DelayHandler;

#[async_trait]
impl ExecutableNode for DelayHandler {
    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let ms = params
            .get("ms")
            .and_then(Value::as_u64)
            .or_else(|| params.get("seconds").and_then(Value::as_u64).map(|s| s * 1000))
            .ok_or_else(|| NodeError::Fatal("delay action requires a numeric 'ms' or 'seconds' parameter".into()))?;

        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn ctx() -> ExecutionContext {
        ExecutionContext { workflow_id: Uuid::new_v4(), execution_id: Uuid::new_v4(), input: Value::Null, secrets: Default::default() }
    }

    #[tokio::test]
    async fn sleeps_and_passes_params_through() {
        let handler = DelayHandler;
        let result = handler.execute(json!({"ms": 1}), &ctx()).await.unwrap();
        assert_eq!(result["ms"], json!(1));
    }

    #[tokio::test]
    async fn missing_duration_is_fatal() {
        let handler = DelayHandler;
        let err = handler.execute(json!({}), &ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::Fatal(_)));
    }
}
