//! Engine error types.

use thiserror::Error;

/// Failure reported by a record source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Record source unavailable: {0}")]
    Unavailable(String),

    #[error("Record source returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Malformed record page: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether re-running the same query may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Orchestrator has stopped")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Record set error: {0}")]
    RecordSet(#[from] tradelog_stats::StatsError),
}

pub type EngineResult<T> = Result<T, EngineError>;
