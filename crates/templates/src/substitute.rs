//! Walks a parameter structure and rewrites every `{{expr}}` tag it finds.

use fields::resolve_presence;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::TemplateError;
use crate::expr::{self, Expr};
use crate::format::format_value;
use crate::helpers;
use crate::models::{TemplateMode, TemplateOptions};
use crate::safety::is_denylisted;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());

/// Recursively resolve every string in `value` against `variables`.
pub fn resolve(value: &Value, variables: &Value, options: &TemplateOptions) -> Result<Value, TemplateError> {
    resolve_depth(value, variables, options, 0)
}

fn resolve_depth(
    value: &Value,
    variables: &Value,
    options: &TemplateOptions,
    depth: usize,
) -> Result<Value, TemplateError> {
    if depth > options.max_depth {
        return Err(TemplateError::DepthExceeded { max_depth: options.max_depth });
    }

    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, variables, options)?)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_depth(item, variables, options, depth + 1)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_depth(v, variables, options, depth + 1)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, variables: &Value, options: &TemplateOptions) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(s.len());
    let mut last_end = 0;

    for caps in TAG.captures_iter(s) {
        let whole = caps.get(0).unwrap();
        let inner = caps.get(1).unwrap().as_str();

        out.push_str(&s[last_end..whole.start()]);
        out.push_str(&evaluate_tag(inner, whole.as_str(), variables, options)?);
        last_end = whole.end();
    }
    out.push_str(&s[last_end..]);

    Ok(out)
}

fn evaluate_tag(
    inner: &str,
    original_tag: &str,
    variables: &Value,
    options: &TemplateOptions,
) -> Result<String, TemplateError> {
    let trimmed = inner.trim();

    if is_denylisted(trimmed) {
        return match options.mode {
            TemplateMode::Strict => Err(TemplateError::Denylisted { expr: trimmed.to_string() }),
            TemplateMode::Lenient => Ok(fallback(options, original_tag)),
        };
    }

    match expr::parse(trimmed) {
        Expr::Path(path) => match resolve_presence(variables, &path, 50) {
            Some(value) => Ok(format_value(&value)),
            None => match options.mode {
                TemplateMode::Strict => Err(TemplateError::UnresolvedPath { path }),
                TemplateMode::Lenient => Ok(fallback(options, original_tag)),
            },
        },
        Expr::Call { name, args } => {
            let resolved_args: Vec<Value> = args.iter().map(|a| a.resolve(variables)).collect();
            match helpers::call(&name, &resolved_args) {
                Ok(value) => Ok(format_value(&value)),
                Err(e) => match options.mode {
                    TemplateMode::Strict => Err(e),
                    TemplateMode::Lenient => Ok(fallback(options, original_tag)),
                },
            }
        }
    }
}

fn fallback(options: &TemplateOptions, original_tag: &str) -> String {
    options.default_value.clone().unwrap_or_else(|| original_tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle() -> Value {
        json!({
            "trigger": {
                "payload": {
                    "pull_request": {"number": 42},
                    "sender": {"login": "alice"}
                }
            }
        })
    }

    #[test]
    fn substitutes_bare_path_and_helper_call() {
        let options = TemplateOptions::default();
        let tmpl = json!("pr #{{trigger.payload.pull_request.number}} by {{upper(trigger.payload.sender.login)}}");
        let out = resolve(&tmpl, &bundle(), &options).unwrap();
        assert_eq!(out, json!("pr #42 by ALICE"));
    }

    #[test]
    fn strict_mode_errors_on_unresolved_path() {
        let options = TemplateOptions { mode: TemplateMode::Strict, ..Default::default() };
        let tmpl = json!("{{missing.field}}");
        assert!(resolve(&tmpl, &bundle(), &options).is_err());
    }

    #[test]
    fn lenient_mode_uses_default() {
        let options = TemplateOptions {
            mode: TemplateMode::Lenient,
            default_value: Some(String::new()),
            ..Default::default()
        };
        let tmpl = json!("{{missing.field}}");
        let out = resolve(&tmpl, &bundle(), &options).unwrap();
        assert_eq!(out, json!(""));
    }

    #[test]
    fn lenient_mode_without_default_leaves_tag() {
        let options = TemplateOptions::default();
        let tmpl = json!("{{missing.field}}");
        let out = resolve(&tmpl, &bundle(), &options).unwrap();
        assert_eq!(out, json!("{{missing.field}}"));
    }

    #[test]
    fn denylisted_expression_fails_strict_and_falls_back_lenient() {
        let strict = TemplateOptions { mode: TemplateMode::Strict, ..Default::default() };
        assert!(resolve(&json!("{{process.env.SECRET}}"), &bundle(), &strict).is_err());

        let lenient = TemplateOptions {
            mode: TemplateMode::Lenient,
            default_value: Some("REDACTED".into()),
            ..Default::default()
        };
        let out = resolve(&json!("{{process.env.SECRET}}"), &bundle(), &lenient).unwrap();
        assert_eq!(out, json!("REDACTED"));
    }

    #[test]
    fn no_template_strings_round_trips_unchanged() {
        let options = TemplateOptions::default();
        let obj = json!({"a": 1, "b": [true, null, "plain"], "c": {"d": "e"}});
        let out = resolve(&obj, &bundle(), &options).unwrap();
        assert_eq!(out, obj);
    }

    #[test]
    fn depth_exceeded_is_fatal() {
        let options = TemplateOptions { max_depth: 1, ..Default::default() };
        let obj = json!({"a": {"b": {"c": "{{x}}"}}});
        assert!(matches!(
            resolve(&obj, &bundle(), &options),
            Err(TemplateError::DepthExceeded { .. })
        ));
    }
}
