//! `conditions` crate — boolean predicate trees over resolved fields (C2).

pub mod error;
pub mod evaluate;
pub mod models;

pub use error::ConditionError;
pub use evaluate::evaluate_group;
pub use models::{ConditionGroup, ConditionNode, FilterRule, LogicalOperator, Operator};
