//! Predicate evaluation over a resolved field.

use fields::resolve_presence;
use regex::Regex;
use serde_json::Value;

use crate::error::ConditionError;
use crate::models::{ConditionGroup, ConditionNode, FilterRule, LogicalOperator, Operator};

const MAX_DEPTH: usize = 50;

/// Evaluate a full condition tree against `context`.
pub fn evaluate_group(group: &ConditionGroup, context: &Value) -> Result<bool, ConditionError> {
    if group.rules.is_empty() {
        return Ok(true);
    }

    match group.operator {
        LogicalOperator::And => {
            for rule in &group.rules {
                if !evaluate_node(rule, context)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        LogicalOperator::Or => {
            for rule in &group.rules {
                if evaluate_node(rule, context)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        LogicalOperator::Not => {
            for rule in &group.rules {
                if evaluate_node(rule, context)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn evaluate_node(node: &ConditionNode, context: &Value) -> Result<bool, ConditionError> {
    match node {
        ConditionNode::Rule(rule) => evaluate_rule(rule, context),
        ConditionNode::Group(group) => evaluate_group(group, context),
    }
}

fn evaluate_rule(rule: &FilterRule, context: &Value) -> Result<bool, ConditionError> {
    let present = resolve_presence(context, &rule.field, MAX_DEPTH);

    match rule.operator {
        Operator::Exists => Ok(present.is_some()),
        Operator::NotExists => Ok(present.is_none()),
        Operator::IsNull => Ok(present.as_ref().map(Value::is_null).unwrap_or(true)),
        Operator::IsNotNull => Ok(!present.as_ref().map(Value::is_null).unwrap_or(true)),
        _ => {
            let Some(actual) = present else { return Ok(false) };
            evaluate_value_operator(rule, &actual)
        }
    }
}

fn evaluate_value_operator(rule: &FilterRule, actual: &Value) -> Result<bool, ConditionError> {
    match rule.operator {
        Operator::Equals => Ok(actual == &rule.value),
        Operator::NotEquals => Ok(actual != &rule.value),

        Operator::Contains => Ok(contains(actual, &rule.value)),
        Operator::NotContains => Ok(!contains(actual, &rule.value)),

        Operator::StartsWith => Ok(str_pair(actual, &rule.value)
            .map(|(a, b)| a.starts_with(b))
            .unwrap_or(false)),
        Operator::EndsWith => Ok(str_pair(actual, &rule.value)
            .map(|(a, b)| a.ends_with(b))
            .unwrap_or(false)),

        Operator::Regex => {
            let (Some(haystack), Some(pattern)) = (actual.as_str(), rule.value.as_str()) else {
                return Ok(false);
            };
            match Regex::new(pattern) {
                Ok(re) => Ok(re.is_match(haystack)),
                Err(_) => Ok(false),
            }
        }

        Operator::In => Ok(membership(&rule.value, actual)),
        Operator::NotIn => Ok(!membership(&rule.value, actual)),

        Operator::GreaterThan => Ok(numeric_cmp(actual, &rule.value, |a, b| a > b)),
        Operator::LessThan => Ok(numeric_cmp(actual, &rule.value, |a, b| a < b)),
        Operator::GreaterEqual => Ok(numeric_cmp(actual, &rule.value, |a, b| a >= b)),
        Operator::LessEqual => Ok(numeric_cmp(actual, &rule.value, |a, b| a <= b)),

        Operator::Between => evaluate_between(rule, actual),

        Operator::IsNull | Operator::IsNotNull | Operator::Exists | Operator::NotExists => {
            unreachable!("handled by evaluate_rule before reaching here")
        }
    }
}

fn contains(actual: &Value, needle: &Value) -> bool {
    match (actual, needle) {
        (Value::String(s), Value::String(n)) => s.contains(n.as_str()),
        (Value::Array(items), _) => items.contains(needle),
        _ => false,
    }
}

fn str_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}

fn membership(haystack: &Value, needle: &Value) -> bool {
    match haystack.as_array() {
        Some(items) => items.contains(needle),
        None => false,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn numeric_cmp(actual: &Value, rhs: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (to_f64(actual), to_f64(rhs)) {
        (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => op(a, b),
        _ => false,
    }
}

fn evaluate_between(rule: &FilterRule, actual: &Value) -> Result<bool, ConditionError> {
    let pair = rule.value.as_array();
    let (Some(pair), Some(v)) = (pair, to_f64(actual)) else {
        return Ok(false);
    };
    if pair.len() != 2 {
        return Ok(false);
    }
    let (Some(a), Some(b)) = (to_f64(&pair[0]), to_f64(&pair[1])) else {
        return Ok(false);
    };
    if v.is_nan() || a.is_nan() || b.is_nan() {
        return Ok(false);
    }
    Ok(a <= v && v <= b)
}
