//! The built-in helper library callable from `{{name(args)}}`.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde_json::Value;

use crate::error::TemplateError;

/// Dispatch a helper call by name.
pub fn call(name: &str, args: &[Value]) -> Result<Value, TemplateError> {
    match name {
        "upper" => Ok(Value::String(as_str(name, args, 0)?.to_uppercase())),
        "lower" => Ok(Value::String(as_str(name, args, 0)?.to_lowercase())),
        "trim" => Ok(Value::String(as_str(name, args, 0)?.trim().to_string())),
        "length" => Ok(Value::Number(length_of(&arg(name, args, 0)?).into())),

        "formatDate" => format_date(name, args),
        "addDays" => add_days(name, args),

        "add" => Ok(num_result(as_f64(name, args, 0)? + as_f64(name, args, 1)?)),
        "subtract" => Ok(num_result(as_f64(name, args, 0)? - as_f64(name, args, 1)?)),
        "multiply" => Ok(num_result(as_f64(name, args, 0)? * as_f64(name, args, 1)?)),
        "divide" => {
            let divisor = as_f64(name, args, 1)?;
            if divisor == 0.0 {
                return Err(TemplateError::InvalidHelperArgs {
                    name: name.to_string(),
                    reason: "division by zero".to_string(),
                });
            }
            Ok(num_result(as_f64(name, args, 0)? / divisor))
        }

        "round" => {
            let n = as_f64(name, args, 0)?;
            let digits = args.get(1).and_then(Value::as_f64).unwrap_or(0.0) as i32;
            let factor = 10f64.powi(digits);
            Ok(num_result((n * factor).round() / factor))
        }

        "join" => {
            let items = as_array(name, args, 0)?;
            let sep = args.get(1).and_then(Value::as_str).unwrap_or(",");
            let joined = items
                .iter()
                .map(crate::format::format_value)
                .collect::<Vec<_>>()
                .join(sep);
            Ok(Value::String(joined))
        }

        "first" => Ok(as_array(name, args, 0)?.first().cloned().unwrap_or(Value::Null)),
        "last" => Ok(as_array(name, args, 0)?.last().cloned().unwrap_or(Value::Null)),

        "slice" => {
            let items = as_array(name, args, 0)?;
            let start = args.get(1).and_then(Value::as_i64).unwrap_or(0).max(0) as usize;
            let end = args
                .get(2)
                .and_then(Value::as_i64)
                .map(|n| n.max(0) as usize)
                .unwrap_or(items.len())
                .min(items.len());
            let start = start.min(end);
            Ok(Value::Array(items[start..end].to_vec()))
        }

        "keys" => {
            let obj = as_object(name, args, 0)?;
            Ok(Value::Array(obj.keys().map(|k| Value::String(k.clone())).collect()))
        }
        "values" => {
            let obj = as_object(name, args, 0)?;
            Ok(Value::Array(obj.values().cloned().collect()))
        }

        "if" => {
            let cond = args.first().map(is_truthy).unwrap_or(false);
            let idx = if cond { 1 } else { 2 };
            Ok(args.get(idx).cloned().unwrap_or(Value::Null))
        }

        "default" => {
            let v = args.first().cloned().unwrap_or(Value::Null);
            if v.is_null() {
                Ok(args.get(1).cloned().unwrap_or(Value::Null))
            } else {
                Ok(v)
            }
        }

        "urlEncode" => Ok(Value::String(urlencoding::encode(as_str(name, args, 0)?).into_owned())),
        "urlDecode" => Ok(Value::String(
            urlencoding::decode(as_str(name, args, 0)?)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| as_str(name, args, 0).unwrap_or_default().to_string()),
        )),

        "toJson" => Ok(Value::String(
            serde_json::to_string(&arg(name, args, 0)?).unwrap_or_default(),
        )),
        "fromJson" => {
            let s = as_str(name, args, 0)?;
            serde_json::from_str(s).map_err(|e| TemplateError::InvalidHelperArgs {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }

        other => Err(TemplateError::UnknownHelper { name: other.to_string() }),
    }
}

fn arg(name: &str, args: &[Value], idx: usize) -> Result<Value, TemplateError> {
    args.get(idx).cloned().ok_or_else(|| TemplateError::InvalidHelperArgs {
        name: name.to_string(),
        reason: format!("missing argument {idx}"),
    })
}

fn as_str<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a str, TemplateError> {
    args.get(idx).and_then(Value::as_str).ok_or_else(|| TemplateError::InvalidHelperArgs {
        name: name.to_string(),
        reason: format!("argument {idx} is not a string"),
    })
}

fn as_f64(name: &str, args: &[Value], idx: usize) -> Result<f64, TemplateError> {
    args.get(idx)
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| TemplateError::InvalidHelperArgs {
            name: name.to_string(),
            reason: format!("argument {idx} is not numeric"),
        })
}

fn as_array<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a Vec<Value>, TemplateError> {
    args.get(idx).and_then(Value::as_array).ok_or_else(|| TemplateError::InvalidHelperArgs {
        name: name.to_string(),
        reason: format!("argument {idx} is not an array"),
    })
}

fn as_object<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a serde_json::Map<String, Value>, TemplateError> {
    args.get(idx).and_then(Value::as_object).ok_or_else(|| TemplateError::InvalidHelperArgs {
        name: name.to_string(),
        reason: format!("argument {idx} is not an object"),
    })
}

fn length_of(v: &Value) -> u64 {
    match v {
        Value::String(s) => s.chars().count() as u64,
        Value::Array(a) => a.len() as u64,
        Value::Object(o) => o.len() as u64,
        _ => 0,
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn num_result(n: f64) -> Value {
    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn parse_datetime(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc)),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn format_date(name: &str, args: &[Value]) -> Result<Value, TemplateError> {
    let raw = arg(name, args, 0)?;
    let dt = parse_datetime(&raw).ok_or_else(|| TemplateError::InvalidHelperArgs {
        name: name.to_string(),
        reason: "argument 0 is not a parseable date".to_string(),
    })?;
    let fmt = args.get(1).and_then(Value::as_str).unwrap_or("iso");
    let formatted = match fmt {
        "date" => dt.format("%Y-%m-%d").to_string(),
        "time" => dt.format("%H:%M:%S").to_string(),
        _ => dt.to_rfc3339(),
    };
    Ok(Value::String(formatted))
}

fn add_days(name: &str, args: &[Value]) -> Result<Value, TemplateError> {
    let raw = arg(name, args, 0)?;
    let dt = parse_datetime(&raw).ok_or_else(|| TemplateError::InvalidHelperArgs {
        name: name.to_string(),
        reason: "argument 0 is not a parseable date".to_string(),
    })?;
    let days = as_f64(name, args, 1)? as i64;
    let shifted = dt + Duration::days(days);
    Ok(Value::String(shifted.to_rfc3339()))
}

/// Build the `now` sub-bundle (ISO, epoch ms, calendar components).
pub fn now_bundle(at: DateTime<Utc>) -> Value {
    serde_json::json!({
        "iso": at.to_rfc3339(),
        "epochMs": at.timestamp_millis(),
        "year": at.year(),
        "month": at.month(),
        "day": at.day(),
        "hour": at.hour(),
        "minute": at.minute(),
        "second": at.second(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upper_and_lower() {
        assert_eq!(call("upper", &[json!("abc")]).unwrap(), json!("ABC"));
        assert_eq!(call("lower", &[json!("ABC")]).unwrap(), json!("abc"));
    }

    #[test]
    fn arithmetic_helpers() {
        assert_eq!(call("add", &[json!(1), json!(2)]).unwrap(), json!(3.0));
        assert_eq!(call("round", &[json!(1.2345), json!(2)]).unwrap(), json!(1.23));
    }

    #[test]
    fn divide_by_zero_errors() {
        assert!(call("divide", &[json!(1), json!(0)]).is_err());
    }

    #[test]
    fn join_and_slice() {
        assert_eq!(call("join", &[json!([1, 2, 3]), json!("-")]).unwrap(), json!("1-2-3"));
        assert_eq!(call("slice", &[json!([1, 2, 3, 4]), json!(1), json!(3)]).unwrap(), json!([2, 3]));
    }

    #[test]
    fn if_and_default() {
        assert_eq!(call("if", &[json!(true), json!("t"), json!("f")]).unwrap(), json!("t"));
        assert_eq!(call("default", &[Value::Null, json!("fallback")]).unwrap(), json!("fallback"));
    }

    #[test]
    fn unknown_helper_errors() {
        assert!(call("bogus", &[]).is_err());
    }
}
