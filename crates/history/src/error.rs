use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history store error: {0}")]
    Store(String),
    #[error("execution {0} not found")]
    NotFound(uuid::Uuid),
}
