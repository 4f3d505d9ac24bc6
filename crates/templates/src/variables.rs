//! Assembles the variable bundle templates resolve against.
//!
//! Secrets are never included here — callers must not pass them in.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::helpers::now_bundle;

#[derive(Debug, Clone, Default)]
pub struct VariableBundle {
    pub workflow: Value,
    pub trigger: Value,
    pub repository: Value,
    pub execution: Value,
    pub variables: Value,
}

impl VariableBundle {
    /// Materialize the bundle, injecting the `now` sub-bundle as of `at`.
    pub fn into_value(self, at: DateTime<Utc>) -> Value {
        json!({
            "workflow": self.workflow,
            "trigger": self.trigger,
            "repository": self.repository,
            "execution": self.execution,
            "variables": self.variables,
            "now": now_bundle(at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn secrets_are_not_a_field() {
        let bundle = VariableBundle {
            workflow: json!({"name": "wf"}),
            ..Default::default()
        };
        let value = bundle.into_value(Utc::now());
        assert!(value.get("secrets").is_none());
        assert!(value.get("now").is_some());
    }
}
