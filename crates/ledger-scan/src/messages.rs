//! The message contract between a session and its chunk supplier.
//!
//! These types are transport-agnostic. Field names serialize in camelCase.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use ledger_scan_core::{BalanceMap, Chunk};

use crate::error::ScanError;

/// One chunk submitted for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// The chunk bytes.
    pub chunk: Bytes,
    /// Absolute file offset of the first byte.
    pub offset: u64,
    /// Requested currency codes, in priority order.
    pub currencies: Vec<String>,
}

impl ScanRequest {
    /// Create a request.
    pub fn new<S: AsRef<str>>(chunk: impl Into<Bytes>, offset: u64, currencies: &[S]) -> Self {
        Self {
            chunk: chunk.into(),
            offset,
            currencies: currencies.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Split into the chunk and the requested currencies.
    pub fn into_parts(self) -> (Chunk, Vec<String>) {
        (Chunk::new(self.offset, self.chunk), self.currencies)
    }
}

/// Snapshot returned after a successful chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResult {
    /// All balances aggregated so far.
    pub balances: BalanceMap,
    /// The chunk's offset plus its length.
    pub bytes_processed: u64,
}

/// Failure report for a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    /// Human-readable description.
    pub message: String,
}

impl From<&ScanError> for ErrorResult {
    fn from(e: &ScanError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl From<ScanError> for ErrorResult {
    fn from(e: ScanError) -> Self {
        Self::from(&e)
    }
}
