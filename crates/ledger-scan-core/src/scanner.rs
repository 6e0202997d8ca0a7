//! Chunk scanner: walks a chunk looking for currency records.
//!
//! A record is an identifier (ASCII code or big-endian numeric alias)
//! followed by an amount in one of the [`AmountEncoding`]s. At each cursor
//! position the scanner tries every ASCII pattern in table order, then the
//! numeric aliases, then advances by one byte, or by four over bytes that look
//! like padding. Nothing is carried across chunk boundaries here.
//!
//! [`AmountEncoding`]: crate::decoder::AmountEncoding

use serde::{Deserialize, Serialize};

use crate::balance::BalanceAggregator;
use crate::decoder::{decode_amount, DecodedAmount};
use crate::patterns::PatternTable;

/// Bytes reserved at the end of a chunk; cursors at or past `len - TAIL_RESERVE` are not scanned.
pub const TAIL_RESERVE: usize = 11;

/// Bytes skipped past an ASCII identifier after a successful decode.
pub const ASCII_AMOUNT_STRIDE: usize = 8;

/// Cursor advance after a numeric-alias record (2-byte alias + 8-byte amount).
pub const NUMERIC_RECORD_STRIDE: usize = 10;

/// Cursor advance over a byte that looks like padding.
pub const PADDING_SKIP: usize = 4;

/// How an identifier was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// The ASCII code bytes.
    Ascii,
    /// The 16-bit big-endian numeric alias.
    Numeric,
}

/// One recognized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Currency code.
    pub currency: String,
    /// Chunk-relative offset of the identifier.
    pub offset: usize,
    /// Which representation matched.
    pub kind: MatchKind,
    /// The decoded amount.
    pub amount: DecodedAmount,
}

/// Result of a detection pass over one buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    /// Records found, in offset order.
    pub detections: Vec<Detection>,
    /// Final cursor position. Bytes from here on were never tried as a match start.
    pub resume_at: usize,
}

/// Whether `byte` is skipped with a wider stride when nothing matched.
pub fn is_padding_byte(byte: u8) -> bool {
    matches!(byte, 0x00 | 0xFF | 0x80..=0xBF)
}

/// Scans byte buffers against a pattern table.
#[derive(Debug, Clone, Copy)]
pub struct ChunkScanner<'t> {
    table: &'t PatternTable,
}

impl<'t> ChunkScanner<'t> {
    /// Create a scanner over `table`.
    pub fn new(table: &'t PatternTable) -> Self {
        Self { table }
    }

    /// Find all records in `data` without touching any aggregate state.
    pub fn detect(&self, data: &[u8]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let limit = data.len().saturating_sub(TAIL_RESERVE);
        let mut i = 0;

        while i < limit {
            if let Some((detection, stride)) = self.match_at(data, i) {
                outcome.detections.push(detection);
                i += stride;
                continue;
            }

            i += if is_padding_byte(data[i]) { PADDING_SKIP } else { 1 };
        }

        outcome.resume_at = i;
        outcome
    }

    /// Scan `data` and record every detection into `aggregator`.
    ///
    /// Returns the number of records found.
    pub fn scan(&self, data: &[u8], aggregator: &mut BalanceAggregator) -> usize {
        let outcome = self.detect(data);
        for detection in &outcome.detections {
            aggregator.record(&detection.currency, detection.amount.value);
        }
        outcome.detections.len()
    }

    /// Try an ASCII match, then a numeric-alias match, at cursor `i`.
    fn match_at(&self, data: &[u8], i: usize) -> Option<(Detection, usize)> {
        for id in self.table {
            if !id.matches_ascii(data, i) {
                continue;
            }
            let len = id.ascii().len();
            if let Some(amount) = decode_amount(data, i + len) {
                let detection = Detection {
                    currency: id.code().to_string(),
                    offset: i,
                    kind: MatchKind::Ascii,
                    amount,
                };
                return Some((detection, len + ASCII_AMOUNT_STRIDE));
            }
        }

        let alias = u16::from_be_bytes(data.get(i..i + 2)?.try_into().ok()?);
        for id in self.table.iter().filter(|id| id.numeric() == Some(alias)) {
            if let Some(amount) = decode_amount(data, i + 2) {
                let detection = Detection {
                    currency: id.code().to_string(),
                    offset: i,
                    kind: MatchKind::Numeric,
                    amount,
                };
                return Some((detection, NUMERIC_RECORD_STRIDE));
            }
        }

        None
    }
}
