//! The scan session: owns one file's balances across many chunks.
//!
//! Chunks are processed to completion one at a time. Cancellation is a
//! one-way latch checked when a chunk is submitted; a chunk already past that
//! check runs to the end.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ledger_scan_core::{
    BalanceAggregator, BalanceMap, Chunk, ChunkScanner, CurrencyBalance, CurrencyCatalog,
    PatternError, PatternTable, ScanOutcome,
};

use crate::error::{Result, ScanError};
use crate::messages::{ProgressResult, ScanRequest};

/// Configuration for a scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Carry the unscanned end of each chunk into the next one.
    ///
    /// Off by default: records straddling a chunk boundary are then missed.
    pub carry_tail: bool,
    /// Size of the whole input, used for progress reporting.
    pub total_size: Option<u64>,
    /// Registry of numeric aliases and account names.
    pub catalog: CurrencyCatalog,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            carry_tail: false,
            total_size: None,
            catalog: CurrencyCatalog::default(),
        }
    }
}

/// Shared cancellation flag for a session.
///
/// Clones observe the same flag, so a handle can be moved to another task or
/// thread while the session is busy.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Latch the session as cancelled. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancel has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters kept by a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Chunks scanned successfully.
    pub chunks_processed: u64,
    /// Records recorded into the balances.
    pub detections: u64,
    /// Chunks whose scan failed unexpectedly.
    pub failed_chunks: u64,
}

/// One end-to-end scan over a file.
pub struct ScanSession {
    /// Configuration.
    config: SessionConfig,
    /// Catalog shared with the aggregator.
    catalog: Arc<CurrencyCatalog>,
    /// Built from the first chunk's requested currencies.
    table: Option<PatternTable>,
    /// Running balances.
    aggregator: BalanceAggregator,
    /// Cancellation latch.
    cancel: CancelHandle,
    /// Unscanned bytes from the previous chunk (only with `carry_tail`).
    tail: Vec<u8>,
    /// Leading bytes of the next chunk already consumed by a match (only with `carry_tail`).
    skip: usize,
    /// Offset plus length of the last successful chunk.
    bytes_processed: u64,
    /// Counters.
    stats: SessionStats,
    /// Whether an ignored currency-set change has been reported.
    warned_mismatch: bool,
}

impl ScanSession {
    /// Create a new session.
    pub fn new(config: SessionConfig) -> Self {
        let catalog = Arc::new(config.catalog.clone());
        Self {
            aggregator: BalanceAggregator::with_catalog(Arc::clone(&catalog)),
            catalog,
            config,
            table: None,
            cancel: CancelHandle::default(),
            tail: Vec::new(),
            skip: 0,
            bytes_processed: 0,
            stats: SessionStats::default(),
            warned_mismatch: false,
        }
    }

    /// Create a session with its pattern table built up front.
    pub fn with_currencies<S: AsRef<str>>(config: SessionConfig, currencies: &[S]) -> Result<Self> {
        let mut session = Self::new(config);
        session.reconfigure(currencies)?;
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Chunk Processing
    // ─────────────────────────────────────────────────────────────────────────

    /// Scan one chunk and return the updated balances.
    ///
    /// The pattern table is built from `currencies` on the first call. Later
    /// calls requesting a different set do not change it; use
    /// [`reconfigure`](Self::reconfigure) for that.
    pub fn process_chunk<S: AsRef<str>>(
        &mut self,
        chunk: &Chunk,
        currencies: &[S],
    ) -> Result<ProgressResult> {
        if self.cancel.is_cancelled() {
            tracing::warn!(offset = chunk.offset, "rejecting chunk for cancelled session");
            return Err(ScanError::SessionCancelled);
        }

        self.ensure_table(currencies)?;
        let table = match self.table.as_ref() {
            Some(table) => table,
            None => return Err(ScanError::Configuration(PatternError::EmptyCurrencySet)),
        };

        let (carried, skipped) = if self.config.carry_tail {
            (self.tail.len(), self.skip.min(chunk.len()))
        } else {
            (0, 0)
        };
        let fresh = &chunk.as_slice()[skipped..];
        let buffer: Cow<'_, [u8]> = if carried > 0 {
            let mut joined = Vec::with_capacity(carried + fresh.len());
            joined.extend_from_slice(&self.tail);
            joined.extend_from_slice(fresh);
            Cow::Owned(joined)
        } else {
            Cow::Borrowed(fresh)
        };

        let outcome: ScanOutcome = match guarded(|| ChunkScanner::new(table).detect(&buffer)) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.failed_chunks += 1;
                tracing::warn!("Chunk at offset {} failed: {}", chunk.offset, e);
                return Err(e);
            }
        };

        for detection in &outcome.detections {
            self.aggregator
                .record(&detection.currency, detection.amount.value);
        }

        if self.config.carry_tail {
            let start = outcome.resume_at.min(buffer.len());
            self.tail = buffer[start..].to_vec();
            self.skip = self.skip - skipped + (outcome.resume_at - start);
        }

        self.bytes_processed = chunk.end_offset();
        self.stats.chunks_processed += 1;
        self.stats.detections += outcome.detections.len() as u64;

        tracing::debug!(
            offset = chunk.offset,
            len = chunk.len(),
            carried,
            detections = outcome.detections.len(),
            "scanned chunk"
        );

        Ok(self.snapshot())
    }

    /// Process a request from the message contract.
    pub fn handle(&mut self, request: ScanRequest) -> Result<ProgressResult> {
        let (chunk, currencies) = request.into_parts();
        self.process_chunk(&chunk, &currencies)
    }

    /// Cancel the session. Idempotent; affects only later submissions.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Scan session cancelled after {} chunks", self.stats.chunks_processed);
        }
        self.cancel.cancel();
    }

    /// A handle that can cancel this session from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether the session has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pattern Table
    // ─────────────────────────────────────────────────────────────────────────

    /// Add currencies to the pattern table.
    ///
    /// The table is append-only: codes already present keep their position
    /// and new codes go to the end. Returns how many codes were added.
    pub fn reconfigure<S: AsRef<str>>(&mut self, currencies: &[S]) -> Result<usize> {
        if currencies.is_empty() {
            return Err(PatternError::EmptyCurrencySet.into());
        }

        let added = match self.table.as_mut() {
            Some(table) => table.extend_with(currencies, &self.catalog),
            None => {
                let table = PatternTable::build_with(currencies, &self.catalog)?;
                let added = table.len();
                self.table = Some(table);
                added
            }
        };

        self.warned_mismatch = false;
        tracing::debug!(added, "pattern table reconfigured");
        Ok(added)
    }

    /// The pattern table, once built.
    pub fn pattern_table(&self) -> Option<&PatternTable> {
        self.table.as_ref()
    }

    fn ensure_table<S: AsRef<str>>(&mut self, currencies: &[S]) -> Result<()> {
        match &self.table {
            None => {
                let table = PatternTable::build_with(currencies, &self.catalog)?;
                tracing::debug!(currencies = ?table.codes(), "pattern table built");
                self.table = Some(table);
            }
            Some(table) => {
                if !self.warned_mismatch && !table.covers_exactly(currencies) {
                    tracing::warn!(
                        "Ignoring requested currency set {:?}; session scans for {:?}",
                        currencies.iter().map(|c| c.as_ref()).collect::<Vec<_>>(),
                        table.codes()
                    );
                    self.warned_mismatch = true;
                }
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// All balances and the bytes processed so far.
    pub fn snapshot(&self) -> ProgressResult {
        ProgressResult {
            balances: self.aggregator.snapshot(),
            bytes_processed: self.bytes_processed,
        }
    }

    /// All balances.
    pub fn balances(&self) -> &BalanceMap {
        self.aggregator.balances()
    }

    /// Balance for one currency.
    pub fn balance(&self, currency: &str) -> Option<&CurrencyBalance> {
        self.aggregator.get(currency)
    }

    /// Balances in dashboard order (USD, EUR, then by total descending).
    pub fn ordered_balances(&self) -> Vec<&CurrencyBalance> {
        self.aggregator.ordered()
    }

    /// Offset plus length of the last successful chunk.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Percentage of `total_size` processed, when a total was configured.
    pub fn progress_percent(&self) -> Option<f64> {
        match self.config.total_size {
            Some(total) if total > 0 => {
                Some((self.bytes_processed as f64 / total as f64 * 100.0).min(100.0))
            }
            _ => None,
        }
    }

    /// Session counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Run `f`, turning a panic into [`ScanError::ScanFailed`].
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        ScanError::ScanFailed(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &[u8], cents: u32) -> Vec<u8> {
        let mut out = code.to_vec();
        out.extend_from_slice(&cents.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out
    }

    fn chunk_with(offset: u64, records: &[(&[u8], u32)]) -> Chunk {
        let mut data = Vec::new();
        for (code, cents) in records {
            data.extend_from_slice(&record(code, *cents));
        }
        data.extend_from_slice(&[0u8; 16]);
        Chunk::new(offset, data)
    }

    #[test]
    fn test_single_usd_record() {
        let mut session = ScanSession::default();
        let chunk = Chunk::new(0, {
            let mut d = b"USD".to_vec();
            d.extend_from_slice(&[0x64, 0x00, 0x00, 0x00]);
            d.extend_from_slice(&[0u8; 9]);
            d
        });

        let result = session.process_chunk(&chunk, &["USD"]).unwrap();
        let usd = &result.balances["USD"];
        assert_eq!(usd.total_amount, 1.00);
        assert_eq!(usd.transaction_count, 1);
        assert_eq!(result.bytes_processed, 16);
    }

    #[test]
    fn test_bytes_processed_uses_offset() {
        let mut session = ScanSession::default();
        let chunk = Chunk::new(1_048_576, vec![0u8; 512]);
        let result = session.process_chunk(&chunk, &["USD"]).unwrap();
        assert_eq!(result.bytes_processed, 1_048_576 + 512);
    }

    #[test]
    fn test_cancel_rejects_later_chunks() {
        let mut session = ScanSession::default();
        let first = chunk_with(0, &[(b"EUR", 250)]);
        session.process_chunk(&first, &["EUR"]).unwrap();

        session.cancel();
        session.cancel();
        assert!(session.is_cancelled());

        let second = chunk_with(first.end_offset(), &[(b"EUR", 250)]);
        let err = session.process_chunk(&second, &["EUR"]).unwrap_err();
        assert_eq!(err, ScanError::SessionCancelled);

        // Prior state is intact and unchanged.
        assert_eq!(session.balance("EUR").unwrap().transaction_count, 1);
        assert_eq!(session.bytes_processed(), first.end_offset());
    }

    #[test]
    fn test_cancel_handle_from_other_thread() {
        let mut session = ScanSession::default();
        let handle = session.cancel_handle();
        std::thread::spawn(move || handle.cancel()).join().unwrap();

        let err = session
            .process_chunk(&Chunk::new(0, vec![0u8; 32]), &["USD"])
            .unwrap_err();
        assert!(err.is_terminal());
    }

    #[test]
    fn test_empty_currency_set_fails_fast() {
        let mut session = ScanSession::default();
        let empty: [&str; 0] = [];
        let err = session
            .process_chunk(&Chunk::new(0, vec![0u8; 32]), &empty)
            .unwrap_err();
        assert_eq!(err, ScanError::Configuration(PatternError::EmptyCurrencySet));
        assert!(session.pattern_table().is_none());
    }

    #[test]
    fn test_later_currency_sets_are_ignored() {
        let mut session = ScanSession::default();
        session
            .process_chunk(&chunk_with(0, &[(b"USD", 100)]), &["USD"])
            .unwrap();

        // GBP is requested but the table was fixed by the first chunk.
        let result = session
            .process_chunk(&chunk_with(100, &[(b"GBP", 100)]), &["USD", "GBP"])
            .unwrap();
        assert!(!result.balances.contains_key("GBP"));
        assert_eq!(session.pattern_table().unwrap().codes(), vec!["USD"]);
    }

    #[test]
    fn test_reconfigure_appends() {
        let mut session = ScanSession::default();
        session
            .process_chunk(&chunk_with(0, &[(b"USD", 100)]), &["USD"])
            .unwrap();

        assert_eq!(session.reconfigure(&["GBP", "USD"]).unwrap(), 1);
        assert_eq!(session.pattern_table().unwrap().codes(), vec!["USD", "GBP"]);

        let result = session
            .process_chunk(&chunk_with(100, &[(b"GBP", 100)]), &["USD", "GBP"])
            .unwrap();
        assert_eq!(result.balances["GBP"].total_amount, 1.0);
        assert_eq!(result.balances["GBP"].account_name, "Pound Sterling Account");
    }

    #[test]
    fn test_with_currencies_prebuilds_table() {
        let session = ScanSession::with_currencies(SessionConfig::default(), &["EUR", "JPY"]).unwrap();
        assert_eq!(session.pattern_table().unwrap().codes(), vec!["EUR", "JPY"]);

        let empty: [&str; 0] = [];
        assert!(ScanSession::with_currencies(SessionConfig::default(), &empty).is_err());
    }

    #[test]
    fn test_boundary_record_missed_without_carry() {
        let mut session = ScanSession::default();
        let mut data = vec![b'.'; 20];
        data.extend_from_slice(b"US");
        let first = Chunk::new(0, data);
        let mut rest = b"D".to_vec();
        rest.extend_from_slice(&100u32.to_le_bytes());
        rest.extend_from_slice(&[0u8; 20]);
        let second = Chunk::new(first.end_offset(), rest);

        session.process_chunk(&first, &["USD"]).unwrap();
        let result = session.process_chunk(&second, &["USD"]).unwrap();
        assert!(result.balances.is_empty());
    }

    #[test]
    fn test_boundary_record_found_with_carry() {
        let config = SessionConfig {
            carry_tail: true,
            ..SessionConfig::default()
        };
        let mut session = ScanSession::new(config);
        let mut data = vec![b'.'; 20];
        data.extend_from_slice(b"US");
        let first = Chunk::new(0, data);
        let mut rest = b"D".to_vec();
        rest.extend_from_slice(&100u32.to_le_bytes());
        rest.extend_from_slice(&[0u8; 20]);
        let second = Chunk::new(first.end_offset(), rest);

        session.process_chunk(&first, &["USD"]).unwrap();
        let result = session.process_chunk(&second, &["USD"]).unwrap();
        assert_eq!(result.balances["USD"].transaction_count, 1);
        assert_eq!(result.balances["USD"].total_amount, 1.0);
        assert_eq!(result.bytes_processed, second.end_offset());
    }

    #[test]
    fn test_carry_does_not_double_count() {
        let config = SessionConfig {
            carry_tail: true,
            ..SessionConfig::default()
        };
        let mut session = ScanSession::new(config);
        let first = chunk_with(0, &[(b"USD", 100), (b"USD", 200)]);
        let second = chunk_with(first.end_offset(), &[(b"USD", 300)]);

        session.process_chunk(&first, &["USD"]).unwrap();
        let result = session.process_chunk(&second, &["USD"]).unwrap();
        assert_eq!(result.balances["USD"].transaction_count, 3);
        assert_eq!(result.balances["USD"].total_amount, 6.0);
    }

    #[test]
    fn test_carry_skips_bytes_consumed_past_chunk_end() {
        let catalog = CurrencyCatalog::new(vec![]);
        let config = SessionConfig {
            carry_tail: true,
            catalog,
            ..SessionConfig::default()
        };
        let mut session = ScanSession::new(config);

        // A 6-letter code at 0 with a stride of 14 overshoots a 12-byte chunk by 2.
        let mut data = b"LEDGER".to_vec();
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 2]);
        let first = Chunk::new(0, data);

        // The first two bytes belong to the consumed record and must not be rescanned.
        let mut rest = vec![0u8; 2];
        rest.extend_from_slice(&record(b"LEDGER", 200));
        rest.extend_from_slice(&[0u8; 16]);
        let second = Chunk::new(first.end_offset(), rest);

        session.process_chunk(&first, &["LEDGER"]).unwrap();
        let result = session.process_chunk(&second, &["LEDGER"]).unwrap();
        assert_eq!(result.balances["LEDGER"].transaction_count, 2);
        assert_eq!(result.balances["LEDGER"].total_amount, 3.0);
    }

    #[test]
    fn test_offset_near_u64_max_does_not_panic() {
        let mut session = ScanSession::default();
        let mut data = record(b"USD", 100);
        data.extend_from_slice(&[0u8; 16]);

        let result = session
            .process_chunk(&Chunk::new(u64::MAX - 4, data), &["USD"])
            .unwrap();
        assert_eq!(result.bytes_processed, u64::MAX);
        assert_eq!(result.balances["USD"].total_amount, 1.0);

        // The session keeps working afterwards.
        let result = session
            .process_chunk(&Chunk::new(0, vec![0u8; 32]), &["USD"])
            .unwrap();
        assert_eq!(result.balances["USD"].transaction_count, 1);
    }

    #[test]
    fn test_progress_percent() {
        let config = SessionConfig {
            total_size: Some(1000),
            ..SessionConfig::default()
        };
        let mut session = ScanSession::new(config);
        assert_eq!(session.progress_percent(), Some(0.0));

        session
            .process_chunk(&Chunk::new(0, vec![0u8; 250]), &["USD"])
            .unwrap();
        assert_eq!(session.progress_percent(), Some(25.0));

        assert_eq!(ScanSession::default().progress_percent(), None);
    }

    #[test]
    fn test_stats() {
        let mut session = ScanSession::default();
        session
            .process_chunk(&chunk_with(0, &[(b"USD", 100), (b"EUR", 100)]), &["USD", "EUR"])
            .unwrap();
        session
            .process_chunk(&Chunk::new(100, vec![0u8; 64]), &["USD", "EUR"])
            .unwrap();

        let stats = session.stats();
        assert_eq!(stats.chunks_processed, 2);
        assert_eq!(stats.detections, 2);
        assert_eq!(stats.failed_chunks, 0);
    }

    #[test]
    fn test_guarded_converts_panics() {
        let err = guarded(|| -> u32 { panic!("boom") }).unwrap_err();
        assert_eq!(err, ScanError::ScanFailed("boom".to_string()));

        let err = guarded(|| -> u32 { panic!("{}", String::from("formatted")) }).unwrap_err();
        assert_eq!(err, ScanError::ScanFailed("formatted".to_string()));

        assert_eq!(guarded(|| 7).unwrap(), 7);
    }

    #[test]
    fn test_config_from_json() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"carryTail":true,"totalSize":2048}"#).unwrap();
        assert!(config.carry_tail);
        assert_eq!(config.total_size, Some(2048));
        assert_eq!(config.catalog, CurrencyCatalog::default());
    }
}
