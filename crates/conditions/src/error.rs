//! Condition evaluation errors.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ConditionError {
    #[error("unknown operator encountered during evaluation")]
    UnknownOperator,

    #[error("malformed 'between' value for field '{field}'")]
    MalformedBetween { field: String },
}
