//! Error types for the ledger-scan core.

use thiserror::Error;

/// Errors raised while building a pattern table.
///
/// Decode rejections are not errors: the decoder returns `None` and scanning
/// continues at the next position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("currency set is empty")]
    EmptyCurrencySet,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, PatternError>;
