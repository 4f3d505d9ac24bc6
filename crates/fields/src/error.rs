//! Errors produced while parsing or resolving a field path.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The path string could not be parsed.
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The path was well-formed but resolved to nothing, and `graceful` is false.
    #[error("field path '{path}' did not resolve to a value")]
    NotFound { path: String },

    /// The path has more segments than `max_depth` allows.
    #[error("field path '{path}' exceeds max depth {max_depth}")]
    DepthExceeded { path: String, max_depth: usize },
}
