//! Expression parsing inside a `{{...}}` tag: either a bare path or a
//! helper call `name(arg, arg, ...)`.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Path(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(String),
    Call { name: String, args: Vec<Arg> },
}

/// Parse the trimmed contents of a `{{...}}` tag.
pub fn parse(raw: &str) -> Expr {
    let trimmed = raw.trim();

    if let Some(open) = trimmed.find('(') {
        if trimmed.ends_with(')') {
            let name = trimmed[..open].trim();
            if is_identifier(name) {
                let inner = &trimmed[open + 1..trimmed.len() - 1];
                let args = split_args(inner).into_iter().map(parse_arg).collect();
                return Expr::Call { name: name.to_string(), args };
            }
        }
    }

    Expr::Path(trimmed.to_string())
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().map(|c| c.is_alphabetic() || c == '_').unwrap_or(false)
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Split a helper call's argument list on top-level commas, respecting
/// single/double-quoted strings.
fn split_args(inner: &str) -> Vec<String> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => {
                    parts.push(current.trim().to_string());
                    current = String::new();
                }
                _ => current.push(c),
            },
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn parse_arg(raw: String) -> Arg {
    let s = raw.trim();

    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return Arg::Str(s[1..s.len() - 1].to_string());
    }

    match s {
        "true" => return Arg::Bool(true),
        "false" => return Arg::Bool(false),
        "null" => return Arg::Null,
        _ => {}
    }

    if let Ok(n) = s.parse::<f64>() {
        return Arg::Num(n);
    }

    Arg::Path(s.to_string())
}

impl Arg {
    /// Resolve this argument to a JSON value given the variable bundle.
    pub fn resolve(&self, variables: &Value) -> Value {
        match self {
            Arg::Str(s) => Value::String(s.clone()),
            Arg::Num(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Arg::Bool(b) => Value::Bool(*b),
            Arg::Null => Value::Null,
            Arg::Path(p) => fields::resolve(variables, p, &fields::ResolveOptions::default())
                .unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_path() {
        assert_eq!(parse("a.b.c"), Expr::Path("a.b.c".into()));
    }

    #[test]
    fn parses_helper_call_with_mixed_args() {
        let expr = parse(r#"formatDate(now.iso, 'date')"#);
        assert_eq!(
            expr,
            Expr::Call {
                name: "formatDate".into(),
                args: vec![Arg::Path("now.iso".into()), Arg::Str("date".into())],
            }
        );
    }

    #[test]
    fn parses_numeric_and_literal_args() {
        let expr = parse("round(1.5, 0)");
        assert_eq!(
            expr,
            Expr::Call { name: "round".into(), args: vec![Arg::Num(1.5), Arg::Num(0.0)] }
        );

        let expr = parse("default(a.b, null)");
        assert_eq!(
            expr,
            Expr::Call { name: "default".into(), args: vec![Arg::Path("a.b".into()), Arg::Null] }
        );
    }

    #[test]
    fn call_with_no_args() {
        let expr = parse("now()");
        assert_eq!(expr, Expr::Call { name: "now".into(), args: vec![] });
    }
}
