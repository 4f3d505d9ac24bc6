//! Expression-string denylist — a coarse safety net, not a sandbox.
//!
//! Rejects anything that smells like prototype/constructor access, dynamic
//! code execution, or a runtime global, before the expression is parsed.

const DENYLIST: &[&str] = &[
    "__proto__",
    "prototype",
    "constructor",
    "function",
    "eval",
    "new ",
    "import",
    "require",
    "process",
    "global",
    "window",
    "document",
    "console",
    "settimeout",
    "setinterval",
];

/// Returns true if `expr` matches any denylisted pattern.
pub fn is_denylisted(expr: &str) -> bool {
    let lower = expr.to_lowercase();
    DENYLIST.iter().any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_prototype_access() {
        assert!(is_denylisted("a.__proto__.polluted"));
        assert!(is_denylisted("a.constructor.constructor('return 1')()"));
    }

    #[test]
    fn flags_runtime_globals() {
        assert!(is_denylisted("process.env.SECRET"));
        assert!(is_denylisted("window.location"));
    }

    #[test]
    fn allows_ordinary_paths() {
        assert!(!is_denylisted("trigger.payload.pull_request.number"));
        assert!(!is_denylisted("upper(trigger.payload.sender.login)"));
    }
}
