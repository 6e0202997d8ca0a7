//! # Ledger Scan Worker
//!
//! Message-driven front end for a [`ScanSession`](ledger_scan::ScanSession).
//!
//! ## Overview
//!
//! The chunk supplier (whatever reads and slices the file) talks to a
//! [`ScanWorker`] over a [`Channel`]. The worker owns exactly one session and
//! handles messages one at a time, which serializes chunk submissions.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_scan::{ScanRequest, SessionConfig};
//! use ledger_scan_worker::{spawn_worker, WorkerConfig};
//!
//! async fn example(chunks: Vec<Vec<u8>>) {
//!     let (client, _cancel, handle) =
//!         spawn_worker(SessionConfig::default(), WorkerConfig::default());
//!
//!     let mut offset = 0;
//!     for chunk in chunks {
//!         let len = chunk.len() as u64;
//!         let reply = client
//!             .process(ScanRequest::new(chunk, offset, &["USD", "EUR"]))
//!             .await
//!             .unwrap();
//!         offset += len;
//!         // reply.progress() carries the balances so far
//!     }
//!
//!     let totals = client.finish().await.unwrap();
//!     let report = handle.await.unwrap().unwrap();
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Supplier                            Worker
//!   |-------- Process(chunk) --------->|
//!   |<------- Progress ----------------|
//!   |-------- Process(chunk) --------->|
//!   |<------- Progress / Error --------|
//!   |-------- Cancel ----------------->|   (no reply)
//!   |-------- Finish ----------------->|
//!   |<------- Complete ----------------|
//! ```

pub mod channel;
pub mod error;
pub mod messages;
pub mod worker;

pub use channel::{memory::pair, memory::MemoryChannel, memory::WorkerClient, Channel};
pub use error::{Result, WorkerError};
pub use messages::{WorkerMessage, WorkerResult};
pub use worker::{spawn_worker, ScanWorker, StopReason, WorkerConfig, WorkerReport};
