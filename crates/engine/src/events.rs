//! Execution lifecycle events. Consumers subscribe via `tokio::sync::broadcast`
//! but cannot influence ordering — the engine is the sole producer.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    Started { execution_id: Uuid },
    Completed { execution_id: Uuid },
    Failed { execution_id: Uuid, error: String },
    Timeout { execution_id: Uuid },
    Cancelled { execution_id: Uuid },
}

pub type EventSender = tokio::sync::broadcast::Sender<ExecutionEvent>;
pub type EventReceiver = tokio::sync::broadcast::Receiver<ExecutionEvent>;
