//! Error types for the worker module.

use thiserror::Error;

/// Errors that can occur while running a scan worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The other end of the channel went away.
    #[error("channel closed")]
    ChannelClosed,

    /// Message could not be decoded.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The worker reported a failure.
    #[error("worker reported: {0}")]
    Remote(String),
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
