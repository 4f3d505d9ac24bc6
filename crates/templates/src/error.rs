//! Template engine errors.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TemplateError {
    #[error("unresolved path '{path}' in strict mode")]
    UnresolvedPath { path: String },

    #[error("expression '{expr}' matched the safety denylist")]
    Denylisted { expr: String },

    #[error("template nesting exceeds max depth {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("unknown helper '{name}'")]
    UnknownHelper { name: String },

    #[error("helper '{name}' received invalid arguments: {reason}")]
    InvalidHelperArgs { name: String, reason: String },
}
