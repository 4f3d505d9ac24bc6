//! Action-type gating applied during workflow registration, independent of
//! whether a handler happens to be registered at runtime.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionTypeError {
    #[error("action type '{0}' is not supported: branching must be expressed via action-level conditions and dependsOn ordering, not a conditional or loop action")]
    Unsupported(String),
}

/// `conditional` and `loop` are refused at validation time rather than
/// implemented as recursive pass-throughs or no-op placeholders — workflow
/// branching and iteration are expressed through per-action conditions and
/// `dependsOn`, not through nested action graphs.
pub fn validate_action_type(action_type: &str) -> Result<(), ActionTypeError> {
    match action_type {
        "conditional" | "loop" => Err(ActionTypeError::Unsupported(action_type.to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_and_loop_are_refused() {
        assert!(validate_action_type("conditional").is_err());
        assert!(validate_action_type("loop").is_err());
    }

    #[test]
    fn known_and_namespaced_types_pass() {
        assert!(validate_action_type("delay").is_ok());
        assert!(validate_action_type("http_request").is_ok());
        assert!(validate_action_type("github_create_issue").is_ok());
    }
}
