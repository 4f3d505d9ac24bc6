//! Condition tree types — `ConditionGroup` and `FilterRule`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single leaf predicate over a field path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    #[serde(alias = "matches")]
    Regex,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    Between,
    IsNull,
    IsNotNull,
    Exists,
    NotExists,
}

/// Logical composition of rules and nested groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

/// A boolean predicate tree: a logical operator over an ordered list of
/// rules or nested groups. An empty `rules` list always evaluates to true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: LogicalOperator,
    #[serde(default)]
    pub rules: Vec<ConditionNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Rule(FilterRule),
    Group(ConditionGroup),
}
