//! Error types for tradelog-core.

use std::fmt;
use thiserror::Error;

/// Reason a single input field was rejected.
///
/// Validation never fails as a whole: each rejected field is dropped and
/// reported with one of these reasons while the remaining fields are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown value {value:?}")]
    UnknownValue { value: String },

    #[error("malformed date {value:?}, expected YYYY-MM-DD")]
    MalformedDate { value: String },

    #[error("non-numeric bound {value:?}")]
    NonNumeric { value: String },

    #[error("minimum {min} is greater than maximum {max}")]
    MinGreaterThanMax { min: String, max: String },

    #[error("range start {from} is after range end {to}")]
    ReversedDateRange { from: String, to: String },

    #[error("malformed sort {value:?}, expected field:direction")]
    MalformedSort { value: String },

    #[error("invalid page {value:?}")]
    InvalidPage { value: String },

    #[error("page size {value:?} is not one of 10, 25, 50, 100")]
    PageSizeNotAllowed { value: String },

    #[error("invalid identifier {value:?}")]
    InvalidIdentifier { value: String },

    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

/// A rejected field together with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRejection {
    pub field: String,
    pub error: ValidationError,
}

impl FieldRejection {
    pub fn new(field: impl Into<String>, error: ValidationError) -> Self {
        Self {
            field: field.into(),
            error,
        }
    }
}

impl fmt::Display for FieldRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
