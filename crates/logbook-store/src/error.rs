// ABOUTME: Error types for the journal store: raw storage faults and per-operation failures.
// ABOUTME: Operation errors wrap the underlying StoreError so callers can map them to responses.

use std::time::Duration;

use thiserror::Error;

/// A failure inside the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?} waiting for a database connection")]
    PoolTimeout(Duration),

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("a record with hash {0} is already stored")]
    Conflict(String),

    #[error("stored record {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("storage task failed: {0}")]
    Task(String),
}

/// Failure of one journal operation. None of these are retried internally.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("existence check failed: {0}")]
    ExistenceCheckFailed(#[source] StoreError),

    #[error("bulk write failed: {0}")]
    WriteFailed(#[source] StoreError),

    #[error("page query failed: {0}")]
    QueryFailed(#[source] StoreError),
}

impl JournalError {
    /// True when a concurrent ingest stored the same record first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, JournalError::WriteFailed(StoreError::Conflict(_)))
    }

    pub fn store_error(&self) -> &StoreError {
        match self {
            JournalError::ExistenceCheckFailed(e)
            | JournalError::WriteFailed(e)
            | JournalError::QueryFailed(e) => e,
        }
    }
}
