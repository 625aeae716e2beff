//! Error types for the message feed.

use thiserror::Error;

/// Main error type for store access and task scheduling.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store is closed")]
    Closed,

    #[error("Malformed row: column {column}: {reason}")]
    MalformedRow { column: String, reason: String },

    #[error("Executor has been shut down")]
    ExecutorShutDown,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),

    #[error("Record ids exhausted")]
    IdsExhausted,
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::InvalidSeed(e.to_string())
    }
}

impl FeedError {
    /// True for every condition the gateway absorbs as "store unavailable".
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            FeedError::Unavailable(_) | FeedError::Closed | FeedError::MalformedRow { .. }
        )
    }

    pub(crate) fn malformed(column: &str, reason: impl Into<String>) -> Self {
        FeedError::MalformedRow {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
