//! The substitution formatting rule: every resolved value becomes a string.

use serde_json::Value;

/// `null` becomes empty, structured values become JSON, scalars use their
/// natural printed form.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_becomes_empty() {
        assert_eq!(format_value(&Value::Null), "");
    }

    #[test]
    fn structured_becomes_json() {
        assert_eq!(format_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn scalar_uses_natural_form() {
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!("hi")), "hi");
    }
}
