//! Statistics error types.

use thiserror::Error;
use tradelog_core::TradeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("Record not found: {0}")]
    RecordNotFound(TradeId),

    #[error("Duplicate record id: {0}")]
    DuplicateRecord(TradeId),
}

pub type StatsResult<T> = Result<T, StatsError>;
