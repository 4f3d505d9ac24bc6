pub mod executions;
pub mod history;
pub mod webhooks;
pub mod workflows;

pub use crate::AppState;
