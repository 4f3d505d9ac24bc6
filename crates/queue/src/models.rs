//! The queued event record and queue configuration.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub id: Uuid,
    pub event_type: String,
    pub payload: Value,
    pub headers: HashMap<String, String>,
    pub delivery_id: String,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub retry_budget: u32,
}

impl QueuedEvent {
    pub fn new(event_type: impl Into<String>, payload: Value, headers: HashMap<String, String>, delivery_id: impl Into<String>, retry_budget: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            payload,
            headers,
            delivery_id: delivery_id.into(),
            enqueued_at: Utc::now(),
            retry_count: 0,
            retry_budget,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub capacity: usize,
    pub max_retries: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 1000, max_retries: 3 }
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct QueueStats {
    pub size: usize,
    pub max_size: usize,
    pub processing: usize,
    pub processor_count: usize,
}
