//! `queue` crate — bounded in-memory FIFO with retry requeueing and
//! processor dispatch (C7).

pub mod backoff;
pub mod error;
pub mod models;
pub mod processor;
pub mod queue;

pub use error::QueueError;
pub use models::{QueueConfig, QueuedEvent, QueueStats};
pub use processor::{Processor, ProcessorOutcome, ProcessorRegistry};
pub use queue::EventQueue;
