//! Processor registry — one [`Processor`] per event type, invoked by the
//! queue's dispatch worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::QueuedEvent;

#[derive(Debug, Clone)]
pub enum ProcessorOutcome {
    Success,
    Retryable(String),
    Fatal(String),
}

#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, event: &QueuedEvent) -> ProcessorOutcome;
}

/// Read-mostly registry: writes (registration) require exclusive access;
/// reads are lock-free after the write barrier in practice, though this
/// uses a plain `RwLock` since registration only happens at startup.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: RwLock<HashMap<String, Arc<dyn Processor>>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, event_type: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.write().expect("processor registry lock poisoned").insert(event_type.into(), processor);
    }

    pub fn get(&self, event_type: &str) -> Option<Arc<dyn Processor>> {
        self.processors.read().expect("processor registry lock poisoned").get(event_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.processors.read().expect("processor registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
