//! The `audit_log` action: emits a structured tracing event and returns the
//! logged record. Implementable purely against the ambient logging stack,
//! unlike the other provider-backed action families.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::NodeError;
use crate::traits::{ExecutableNode, ExecutionContext};

pub struct AuditLogHandler;

#[async_trait]
impl ExecutableNode for AuditLogHandler {
    async fn execute(&self, params: Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let message = params.get("message").and_then(Value::as_str).unwrap_or("");
        tracing::info!(
            execution_id = %ctx.execution_id,
            workflow_id = %ctx.workflow_id,
            %message,
            params = %params,
            "audit_log"
        );
        Ok(json!({ "logged": true, "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctx() -> ExecutionContext {
        ExecutionContext { workflow_id: Uuid::new_v4(), execution_id: Uuid::new_v4(), input: Value::Null, secrets: Default::default() }
    }

    #[tokio::test]
    async fn logs_and_echoes_message() {
        let handler = AuditLogHandler;
        let result = handler.execute(json!({"message": "deploy started"}), &ctx()).await.unwrap();
        assert_eq!(result["message"], json!("deploy started"));
        assert_eq!(result["logged"], json!(true));
    }
}
