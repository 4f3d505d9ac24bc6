//! Template engine configuration.

/// Controls how an unresolved path is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    /// An unresolved path fails the whole template.
    Strict,
    /// An unresolved path falls back to a configured default, or is left
    /// as the original `{{tag}}` text if no default is configured.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct TemplateOptions {
    pub mode: TemplateMode,
    /// Fallback text used in lenient mode when a path doesn't resolve.
    pub default_value: Option<String>,
    /// Cap on recursive walk depth through nested maps/sequences.
    pub max_depth: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            mode: TemplateMode::Lenient,
            default_value: None,
            max_depth: 10,
        }
    }
}
