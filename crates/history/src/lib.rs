//! `history` crate — execution snapshot tracking and durable write-behind
//! to a `HistoryStore` (C10).

pub mod active;
pub mod aggregate;
pub mod completed;
pub mod error;
pub mod manager;
pub mod models;
pub mod store;

pub use error::HistoryError;
pub use manager::ExecutionHistory;
pub use models::{ActionResult, ActionStatus, ExecutionSnapshot, ExecutionStatus, Progress};
pub use store::{AggregateResult, HistoryFilter, HistoryStore, Paging, SnapshotPatch};
