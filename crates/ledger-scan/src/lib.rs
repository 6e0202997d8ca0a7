//! # Ledger Scan
//!
//! Streaming scanner for currency records embedded in large binary dumps.
//!
//! ## Overview
//!
//! A legacy settlement file of unknown structure is fed to a [`ScanSession`]
//! one chunk at a time. The session looks for short currency identifiers
//! (ASCII codes such as `USD`, or their ISO-4217 numeric aliases) followed by
//! a binary amount, and keeps running statistics per currency.
//!
//! ## Key Concepts
//!
//! - **Chunk**: A contiguous slice of the file plus its absolute offset.
//! - **Identifier match**: ASCII code or big-endian numeric alias at a position.
//! - **Amount decode**: u32 cents, then f64, then i64 cents, first plausible wins.
//! - **Balance**: Total, count, mean, extrema, and the first 1000 amounts.
//! - **Cancellation**: A one-way latch checked when each chunk is submitted.
//!
//! ## Usage
//!
//! ```rust
//! use ledger_scan::{Chunk, ScanSession, SessionConfig};
//!
//! let mut session = ScanSession::new(SessionConfig::default());
//!
//! let mut bytes = b"USD".to_vec();
//! bytes.extend_from_slice(&100u32.to_le_bytes());
//! bytes.extend_from_slice(&[0u8; 9]);
//!
//! let progress = session.process_chunk(&Chunk::new(0, bytes), &["USD"]).unwrap();
//! assert_eq!(progress.balances["USD"].total_amount, 1.0);
//! assert_eq!(progress.bytes_processed, 16);
//! ```
//!
//! ## Re-exports
//!
//! - `ledger_scan::core` - Pattern table, decoder, scanner, balances

pub mod error;
pub mod messages;
pub mod session;

// Re-export component crates
pub use ledger_scan_core as core;

// Re-export main types for convenience
pub use error::{Result, ScanError};
pub use messages::{ErrorResult, ProgressResult, ScanRequest};
pub use session::{CancelHandle, ScanSession, SessionConfig, SessionStats};

// Re-export commonly used core types
pub use ledger_scan_core::{
    AmountEncoding, BalanceMap, Chunk, CurrencyBalance, CurrencyCatalog, PatternError,
    PatternTable,
};
