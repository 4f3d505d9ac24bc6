//! Resolution semantics over the parsed path grammar.

use serde_json::Value;

use crate::error::FieldError;
use crate::path::{self, Segment};

/// Tuning knobs for a single resolution call.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// When true (default), missing/invalid paths return `default_value`
    /// instead of erroring.
    pub graceful: bool,
    /// Value substituted for a missing result in graceful mode.
    pub default_value: Value,
    /// When true, a present-but-null value is treated the same as missing.
    pub treat_null_as_missing: bool,
    /// Hard cap on the number of segments a path may contain.
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            graceful: true,
            default_value: Value::Null,
            treat_null_as_missing: false,
            max_depth: 50,
        }
    }
}

/// Resolve `path` against `data`. Pure function of `(data, path, options)`.
///
/// Depth-exceeded is always fatal, regardless of `graceful`, since it guards
/// against pathological input rather than an absent field.
pub fn resolve(data: &Value, path: &str, options: &ResolveOptions) -> Result<Value, FieldError> {
    let segments = match path::parse(path) {
        Ok(segs) => segs,
        Err(e) => {
            if options.graceful {
                return Ok(options.default_value.clone());
            }
            return Err(e);
        }
    };

    if segments.len() > options.max_depth {
        return Err(FieldError::DepthExceeded {
            path: path.to_string(),
            max_depth: options.max_depth,
        });
    }

    let resolved = resolve_segments(data, &segments, options.treat_null_as_missing);

    match resolved {
        Some(value) => {
            if options.treat_null_as_missing && value.is_null() {
                if options.graceful {
                    Ok(options.default_value.clone())
                } else {
                    Err(FieldError::NotFound { path: path.to_string() })
                }
            } else {
                Ok(value)
            }
        }
        None => {
            if options.graceful {
                Ok(options.default_value.clone())
            } else {
                Err(FieldError::NotFound { path: path.to_string() })
            }
        }
    }
}

/// Like [`resolve`] but reports whether the path was present at all, even
/// when the resolved value is `null`. Used by the condition evaluator's
/// `exists`/`is_null` operators, which must distinguish the two cases.
pub fn resolve_presence(data: &Value, path: &str, max_depth: usize) -> Option<Value> {
    let segments = path::parse(path).ok()?;
    if segments.len() > max_depth {
        return None;
    }
    resolve_segments(data, &segments, false)
}

fn resolve_segments(value: &Value, segments: &[Segment], treat_null_as_missing: bool) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    match head {
        Segment::Property(key) => match value {
            Value::Object(map) => match map.get(key) {
                Some(v) => {
                    if treat_null_as_missing && v.is_null() && !rest.is_empty() {
                        None
                    } else {
                        resolve_segments(v, rest, treat_null_as_missing)
                    }
                }
                None => None,
            },
            _ => None,
        },
        Segment::Index(idx) => match value {
            Value::Array(items) => {
                let len = items.len() as i64;
                let real = if *idx < 0 { len + idx } else { *idx };
                if real < 0 || real >= len {
                    None
                } else {
                    resolve_segments(&items[real as usize], rest, treat_null_as_missing)
                }
            }
            _ => None,
        },
        Segment::All => match value {
            Value::Array(items) => {
                if rest.is_empty() {
                    Some(Value::Array(items.clone()))
                } else {
                    let mapped: Vec<Value> = items
                        .iter()
                        .filter_map(|item| resolve_segments(item, rest, treat_null_as_missing))
                        .collect();
                    Some(Value::Array(mapped))
                }
            }
            _ => None,
        },
        Segment::Filter { key, value: want } => match value {
            Value::Array(items) => {
                let filtered: Vec<&Value> = items
                    .iter()
                    .filter(|item| {
                        item.get(key)
                            .map(|v| value_matches_str(v, want))
                            .unwrap_or(false)
                    })
                    .collect();

                if rest.is_empty() {
                    Some(Value::Array(filtered.into_iter().cloned().collect()))
                } else {
                    let mapped: Vec<Value> = filtered
                        .into_iter()
                        .filter_map(|item| resolve_segments(item, rest, treat_null_as_missing))
                        .collect();
                    Some(Value::Array(mapped))
                }
            }
            _ => None,
        },
    }
}

fn value_matches_str(value: &Value, want: &str) -> bool {
    match value {
        Value::String(s) => s == want,
        Value::Number(n) => n.to_string() == want,
        Value::Bool(b) => b.to_string() == want,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_property_chain() {
        let data = json!({"a": {"b": {"c": 42}}});
        let v = resolve(&data, "a.b.c", &ResolveOptions::default()).unwrap();
        assert_eq!(v, json!(42));
    }

    #[test]
    fn resolves_negative_index() {
        let data = json!({"items": [1, 2, 3]});
        let v = resolve(&data, "items[-1]", &ResolveOptions::default()).unwrap();
        assert_eq!(v, json!(3));
    }

    #[test]
    fn out_of_bounds_index_is_missing_in_graceful_mode() {
        let data = json!({"items": [1, 2]});
        let v = resolve(&data, "items[5]", &ResolveOptions::default()).unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn non_graceful_missing_path_errors() {
        let data = json!({"a": 1});
        let opts = ResolveOptions { graceful: false, ..Default::default() };
        let err = resolve(&data, "b.c", &opts).unwrap_err();
        assert!(matches!(err, FieldError::NotFound { .. }));
    }

    #[test]
    fn terminal_wildcard_returns_sequence() {
        let data = json!({"items": [1, 2, 3]});
        let v = resolve(&data, "items[*]", &ResolveOptions::default()).unwrap();
        assert_eq!(v, json!([1, 2, 3]));
    }

    #[test]
    fn wildcard_with_remainder_maps_and_drops_missing() {
        let data = json!({"items": [{"name": "a"}, {}, {"name": "c"}]});
        let v = resolve(&data, "items[*].name", &ResolveOptions::default()).unwrap();
        assert_eq!(v, json!(["a", "c"]));
    }

    #[test]
    fn filter_retains_matching_elements() {
        let data = json!({"items": [{"status": "open", "id": 1}, {"status": "closed", "id": 2}]});
        let v = resolve(&data, r#"items[status="open"].id"#, &ResolveOptions::default()).unwrap();
        assert_eq!(v, json!([1]));
    }

    #[test]
    fn exists_distinguishes_missing_from_null() {
        let data = json!({"a": null});
        assert!(resolve_presence(&data, "a", 50).is_some());
        assert!(resolve_presence(&data, "b", 50).is_none());
    }

    #[test]
    fn depth_exceeded_is_always_fatal() {
        let data = json!({});
        let opts = ResolveOptions { max_depth: 1, ..Default::default() };
        let err = resolve(&data, "a.b.c", &opts).unwrap_err();
        assert!(matches!(err, FieldError::DepthExceeded { .. }));
    }

    #[test]
    fn never_mutates_input() {
        let data = json!({"a": [1, 2, 3]});
        let before = data.clone();
        let _ = resolve(&data, "a[*]", &ResolveOptions::default());
        assert_eq!(data, before);
    }
}
