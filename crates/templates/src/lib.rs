//! `templates` crate — `{{expr}}` substitution engine with a small helper
//! library (C3).

pub mod error;
pub mod expr;
pub mod format;
pub mod helpers;
pub mod models;
pub mod safety;
pub mod substitute;
pub mod variables;

pub use error::TemplateError;
pub use models::{TemplateMode, TemplateOptions};
pub use substitute::resolve;
pub use variables::VariableBundle;
