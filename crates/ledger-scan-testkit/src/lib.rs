//! # Ledger Scan Testkit
//!
//! Testing utilities for ledger-scan.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden scenarios**: Chunk sequences with known final balances
//! - **Generators**: Proptest strategies for dump layouts
//! - **Fixtures**: A record builder and a session wrapper
//!
//! ## Golden Scenarios
//!
//! ```rust
//! use ledger_scan_testkit::vectors::verify_all_scenarios;
//!
//! for (name, passed, detail) in verify_all_scenarios() {
//!     assert!(passed, "{}: {}", name, detail);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ledger_scan_testkit::generators::{build_layout, layout};
//!
//! proptest! {
//!     #[test]
//!     fn planted_records_are_found(segments in layout(16)) {
//!         let builder = build_layout(&segments);
//!         // scan builder.finish() and compare with builder.planted()
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ledger_scan_testkit::fixtures::{RecordBuilder, SessionFixture};
//!
//! let dump = RecordBuilder::new()
//!     .noise(1, 32)
//!     .ascii_u32("USD", 1_999)
//!     .finish();
//!
//! let mut fixture = SessionFixture::new(&["USD"]);
//! let balances = fixture.feed(&dump, 4096).unwrap();
//! assert_eq!(balances["USD"].total_amount, 19.99);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{split_chunks, PlantedRecord, RecordBuilder, SessionFixture};
pub use generators::{build_layout, layout, Segment};
pub use vectors::{all_scenarios, run_scenario, verify_all_scenarios, GoldenScenario};
