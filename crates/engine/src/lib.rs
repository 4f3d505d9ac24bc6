//! `engine` crate — core domain models, dependency resolution, and the
//! per-execution workflow engine (C4 + C6).

pub mod dag;
pub mod error;
pub mod events;
pub mod executor;
pub mod models;
pub mod validation;

pub use dag::{build_stage_plan, StagePlan};
pub use error::EngineError;
pub use events::{EventReceiver, EventSender, ExecutionEvent};
pub use executor::{ExecutionResult, ExecutorConfig, WorkflowExecutor};
pub use models::{ActionConfig, ExecutionContext, OnError, Trigger, TriggerSnapshot, WorkflowDefinition};
pub use validation::validate_workflow;

#[cfg(test)]
mod executor_tests;
