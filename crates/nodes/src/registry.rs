//! `ActionExecutorRegistry` — the `ActionExecutor` capability the engine
//! consumes: `execute`, `availableTypes`, `register`, backed by a
//! read-mostly map from action type name to handler.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::NodeError;
use crate::traits::{ExecutableNode, ExecutionContext};

#[derive(Default)]
pub struct ActionExecutorRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ExecutableNode>>>,
}

impl ActionExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the handlers the core ships unconditionally:
    /// `delay` and `audit_log`. Everything else — `http_request`, and any
    /// provider-namespaced family — must be registered by the embedding
    /// application, since their side effects are external collaborators.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("delay", Arc::new(crate::builtins::delay::DelayHandler));
        registry.register("audit_log", Arc::new(crate::builtins::audit_log::AuditLogHandler));
        registry
    }

    pub fn register(&self, action_type: impl Into<String>, handler: Arc<dyn ExecutableNode>) {
        self.handlers.write().expect("action executor registry lock poisoned").insert(action_type.into(), handler);
    }

    pub fn available_types(&self) -> HashSet<String> {
        self.handlers.read().expect("action executor registry lock poisoned").keys().cloned().collect()
    }

    pub async fn execute(&self, action_type: &str, params: Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let handler = {
            let guard = self.handlers.read().expect("action executor registry lock poisoned");
            guard.get(action_type).cloned()
        };

        match handler {
            Some(handler) => handler.execute(params, ctx).await,
            None => Err(NodeError::Fatal(format!("no action executor registered for type '{action_type}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNode;
    use serde_json::json;
    use uuid::Uuid;

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            workflow_id: Uuid::new_v4(),
            execution_id: Uuid::new_v4(),
            input: Value::Null,
            secrets: Default::default(),
        }
    }

    #[tokio::test]
    async fn builtins_are_available_by_default() {
        let registry = ActionExecutorRegistry::with_builtins();
        assert!(registry.available_types().contains("delay"));
        assert!(registry.available_types().contains("audit_log"));
    }

    #[tokio::test]
    async fn unregistered_type_is_a_fatal_error() {
        let registry = ActionExecutorRegistry::new();
        let err = registry.execute("http_request", Value::Null, &ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::Fatal(_)));
    }

    #[tokio::test]
    async fn registered_handler_is_dispatched() {
        let registry = ActionExecutorRegistry::new();
        registry.register("mock", Arc::new(MockNode::returning("m", json!({"ok": true}))));
        let result = registry.execute("mock", json!({}), &ctx()).await.unwrap();
        assert_eq!(result["ok"], json!(true));
    }
}
