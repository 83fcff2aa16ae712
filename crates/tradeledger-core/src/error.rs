//! Error types for the core data model.

use thiserror::Error;

/// Errors raised when a feed record cannot become a [`crate::TradeRow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },

    #[error("invalid trade time: {0:?}")]
    InvalidTime(String),

    #[error("invalid decimal in {field}: {value:?}")]
    InvalidDecimal { field: &'static str, value: String },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, RecordError>;
