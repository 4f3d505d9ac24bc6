//! Bounded in-memory FIFO event queue (C7).
//!
//! Dispatch is single-threaded for ordering; individual processors may
//! spawn their own concurrent work. Retried events are requeued at the
//! *head* of the queue rather than the tail, so redelivery does not starve
//! fresh events behind a long backlog.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::backoff::requeue_delay;
use crate::error::QueueError;
use crate::models::{QueueConfig, QueuedEvent, QueueStats};
use crate::processor::{ProcessorOutcome, ProcessorRegistry};

pub struct EventQueue {
    config: QueueConfig,
    inner: Mutex<VecDeque<QueuedEvent>>,
    notify: Notify,
    processing: AtomicUsize,
}

impl EventQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self { config, inner: Mutex::new(VecDeque::new()), notify: Notify::new(), processing: AtomicUsize::new(0) }
    }

    pub async fn enqueue(&self, event: QueuedEvent) -> Result<(), QueueError> {
        let mut guard = self.inner.lock().await;
        if guard.len() >= self.config.capacity {
            return Err(QueueError::Overflow);
        }
        guard.push_back(event);
        drop(guard);
        self.notify.notify_one();
        Ok(())
    }

    async fn requeue_head(&self, event: QueuedEvent) {
        let mut guard = self.inner.lock().await;
        guard.push_front(event);
        drop(guard);
        self.notify.notify_one();
    }

    async fn dequeue(&self) -> QueuedEvent {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if let Some(event) = guard.pop_front() {
                    return event;
                }
            }
            self.notify.notified().await;
        }
    }

    pub async fn depth(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn stats(&self, registry: &ProcessorRegistry) -> QueueStats {
        QueueStats {
            size: self.depth().await,
            max_size: self.config.capacity,
            processing: self.processing.load(Ordering::Relaxed),
            processor_count: registry.len(),
        }
    }

    /// `true` when the queue is at or above 90% of capacity.
    pub async fn is_unhealthy(&self) -> bool {
        let depth = self.depth().await as f64;
        depth >= 0.9 * self.config.capacity as f64
    }

    /// Drives the single dispatch loop: pop one event, hand it to its
    /// registered processor, act on the outcome. Runs until `shutdown`
    /// resolves.
    pub async fn run_worker(self: &Arc<Self>, registry: Arc<ProcessorRegistry>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            let event = tokio::select! {
                event = self.dequeue() => event,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                    continue;
                }
            };

            let Some(processor) = registry.get(&event.event_type) else {
                tracing::warn!(event_type = %event.event_type, delivery_id = %event.delivery_id, "no processor registered, dropping event");
                continue;
            };

            self.processing.fetch_add(1, Ordering::Relaxed);
            let outcome = processor.process(&event).await;
            self.processing.fetch_sub(1, Ordering::Relaxed);

            match outcome {
                ProcessorOutcome::Success => {}
                ProcessorOutcome::Fatal(reason) => {
                    tracing::error!(delivery_id = %event.delivery_id, %reason, "event processing failed fatally");
                }
                ProcessorOutcome::Retryable(reason) => {
                    self.handle_retryable(event, reason).await;
                }
            }
        }
    }

    async fn handle_retryable(self: &Arc<Self>, mut event: QueuedEvent, reason: String) {
        event.retry_count += 1;
        if event.retry_count > self.config.max_retries.min(event.retry_budget) {
            tracing::error!(delivery_id = %event.delivery_id, retry_count = event.retry_count, %reason, "retry budget exhausted, dropping event");
            return;
        }

        let delay = requeue_delay(event.retry_count);
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.requeue_head(event).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn event(event_type: &str) -> QueuedEvent {
        QueuedEvent::new(event_type, json!({}), HashMap::new(), "delivery-1", 3)
    }

    #[tokio::test]
    async fn enqueue_respects_capacity() {
        let queue = EventQueue::new(QueueConfig { capacity: 1, max_retries: 3 });
        queue.enqueue(event("a")).await.unwrap();
        assert!(matches!(queue.enqueue(event("a")).await, Err(QueueError::Overflow)));
    }

    #[tokio::test]
    async fn dequeue_is_fifo() {
        let queue = EventQueue::new(QueueConfig::default());
        queue.enqueue(event("first")).await.unwrap();
        queue.enqueue(event("second")).await.unwrap();
        assert_eq!(queue.dequeue().await.event_type, "first");
        assert_eq!(queue.dequeue().await.event_type, "second");
    }

    #[tokio::test]
    async fn unhealthy_at_ninety_percent_capacity() {
        let queue = EventQueue::new(QueueConfig { capacity: 10, max_retries: 3 });
        for _ in 0..9 {
            queue.enqueue(event("x")).await.unwrap();
        }
        assert!(queue.is_unhealthy().await);
    }

    #[tokio::test]
    async fn healthy_below_ninety_percent_capacity() {
        let queue = EventQueue::new(QueueConfig { capacity: 10, max_retries: 3 });
        for _ in 0..5 {
            queue.enqueue(event("x")).await.unwrap();
        }
        assert!(!queue.is_unhealthy().await);
    }
}
