//! Error types for scan sessions.

use ledger_scan_core::PatternError;
use thiserror::Error;

/// Errors that can occur while processing chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The session was cancelled before this chunk was submitted.
    #[error("session cancelled")]
    SessionCancelled,

    /// The requested currency set could not be turned into a pattern table.
    #[error("configuration error: {0}")]
    Configuration(#[from] PatternError),

    /// An unexpected failure inside a chunk scan.
    #[error("scan failed: {0}")]
    ScanFailed(String),
}

impl ScanError {
    /// Whether the caller should stop submitting chunks to this session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanError::SessionCancelled)
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, ScanError>;
