//! Schema and business-rule validation applied when a workflow is
//! registered (and re-checked defensively before each run).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dag::prevalidate_warnings;
use crate::models::WorkflowDefinition;
use crate::EngineError;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());

/// Non-blocking warnings surfaced alongside a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning(pub String);

pub fn validate_workflow(workflow: &WorkflowDefinition) -> Result<(), EngineError> {
    if let Some(version) = &workflow.version {
        if !VERSION_RE.is_match(version) {
            return Err(EngineError::Validation(vec![crate::error::ValidationIssue {
                path: "version".to_string(),
                message: format!("'{version}' does not match ^\\d+\\.\\d+\\.\\d+$"),
                code: "invalid_version".to_string(),
            }]));
        }
    }

    for action in &workflow.actions {
        if let Err(source) = nodes::validate_action_type(&action.action_type) {
            return Err(EngineError::UnsupportedActionType { action_id: action.id.clone(), source });
        }
    }

    Ok(())
}

/// Non-blocking warnings: dependency fan-out, action count, condition
/// nesting depth, timeout sanity, and missing error handling. These never
/// prevent registration.
pub fn collect_warnings(workflow: &WorkflowDefinition) -> Vec<Warning> {
    let mut warnings: Vec<Warning> = Vec::new();

    if workflow.actions.len() > 20 {
        warnings.push(Warning(format!("workflow has {} actions; consider splitting it", workflow.actions.len())));
    }

    if workflow.error_handling.is_none() {
        warnings.push(Warning("workflow has no error_handling configured".to_string()));
    }

    if let Some(timeout) = workflow.timeout_seconds {
        if timeout > 3600 {
            warnings.push(Warning(format!("workflow timeout of {timeout}s is unusually long")));
        }
    }

    for action in &workflow.actions {
        if let Some(condition) = &action.condition {
            if condition_depth(condition) > 3 {
                warnings.push(Warning(format!("action '{}' has condition nesting deeper than 3", action.id)));
            }
        }
    }

    warnings.extend(prevalidate_warnings(workflow).into_iter().map(|w| Warning(w.message)));

    warnings
}

fn condition_depth(group: &conditions::ConditionGroup) -> usize {
    1 + group
        .rules
        .iter()
        .map(|node| match node {
            conditions::ConditionNode::Rule(_) => 0,
            conditions::ConditionNode::Group(inner) => condition_depth(inner),
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionConfig, OnError, Trigger};

    fn action(id: &str, action_type: &str) -> ActionConfig {
        ActionConfig {
            id: id.into(),
            action_type: action_type.into(),
            name: id.into(),
            params: serde_json::Value::Null,
            condition: None,
            timeout_seconds: None,
            retry_policy: None,
            on_error: OnError::Stop,
            run_async: false,
            depends_on: vec![],
        }
    }

    #[test]
    fn rejects_conditional_action_type() {
        let wf = WorkflowDefinition::new("wf", Trigger::Manual, vec![action("a", "conditional")]);
        assert!(matches!(validate_workflow(&wf), Err(EngineError::UnsupportedActionType { .. })));
    }

    #[test]
    fn rejects_malformed_version() {
        let mut wf = WorkflowDefinition::new("wf", Trigger::Manual, vec![]);
        wf.version = Some("not-a-version".to_string());
        assert!(matches!(validate_workflow(&wf), Err(EngineError::Validation(_))));
    }

    #[test]
    fn warns_on_missing_error_handling() {
        let wf = WorkflowDefinition::new("wf", Trigger::Manual, vec![action("a", "delay")]);
        let warnings = collect_warnings(&wf);
        assert!(warnings.iter().any(|w| w.0.contains("error_handling")));
    }
}
