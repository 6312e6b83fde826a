//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable")]
    Unavailable,

    #[error("Storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Incompatible payload version {found:?}, expected {expected}")]
    IncompatibleVersion { found: Option<u64>, expected: u64 },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
