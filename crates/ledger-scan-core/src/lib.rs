//! # Ledger Scan Core
//!
//! Pure primitives for locating currency records in arbitrary binary dumps.
//!
//! This crate contains no I/O, no async, no logging. It is pure computation
//! over byte slices.
//!
//! ## Key Types
//!
//! - [`CurrencyCatalog`] - Registry of numeric aliases and account names
//! - [`PatternTable`] - The identifiers a scan looks for, in priority order
//! - [`ChunkScanner`] - Walks a chunk and reports [`Detection`]s
//! - [`BalanceAggregator`] - Running per-currency statistics
//!
//! ## Amount Decoding
//!
//! Amounts are tried as u32 cents, f64, then i64 cents. See [`decoder`].

pub mod balance;
pub mod catalog;
pub mod chunk;
pub mod decoder;
pub mod error;
pub mod patterns;
pub mod scanner;

pub use balance::{BalanceAggregator, BalanceMap, CurrencyBalance, MAX_SAMPLE_AMOUNTS};
pub use catalog::{CatalogEntry, CurrencyCatalog};
pub use chunk::Chunk;
pub use decoder::{decode_amount, AmountEncoding, DecodedAmount};
pub use error::PatternError;
pub use patterns::{CurrencyIdentifier, PatternTable};
pub use scanner::{ChunkScanner, Detection, MatchKind, ScanOutcome};
