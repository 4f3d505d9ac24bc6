use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is at capacity")]
    Overflow,
    #[error("no processor registered for event type {0}")]
    NoProcessor(String),
}
