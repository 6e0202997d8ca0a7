//! Amount decoder: interprets the bytes after an identifier as a monetary value.
//!
//! Three fixed-width little-endian encodings are tried in priority order.
//! The first one whose plausibility check passes wins. Reads past the end of
//! the buffer are rejections, not errors.

use serde::{Deserialize, Serialize};

/// Exclusive upper bound for integer encodings, in cents.
pub const MAX_CENTS: u64 = 100_000_000_000;

/// Exclusive upper bound for the floating-point encoding.
pub const MAX_FLOAT_AMOUNT: f64 = 1_000_000_000.0;

/// A candidate binary encoding for an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountEncoding {
    /// 4-byte unsigned integer, scaled by 1/100.
    U32Cents,
    /// 8-byte IEEE-754 double.
    F64,
    /// 8-byte signed integer, scaled by 1/100.
    I64Cents,
}

impl AmountEncoding {
    /// Encodings in the order the decoder tries them.
    pub const PRIORITY: [AmountEncoding; 3] = [
        AmountEncoding::U32Cents,
        AmountEncoding::F64,
        AmountEncoding::I64Cents,
    ];

    /// Number of bytes the encoding occupies.
    pub const fn width(self) -> usize {
        match self {
            AmountEncoding::U32Cents => 4,
            AmountEncoding::F64 | AmountEncoding::I64Cents => 8,
        }
    }

    /// Decode at `offset` if enough bytes remain and the value is plausible.
    pub fn try_decode(self, data: &[u8], offset: usize) -> Option<f64> {
        match self {
            AmountEncoding::U32Cents => {
                let raw = u32::from_le_bytes(read_array(data, offset)?);
                (raw > 0 && u64::from(raw) < MAX_CENTS).then(|| f64::from(raw) / 100.0)
            }
            AmountEncoding::F64 => {
                let value = f64::from_le_bytes(read_array(data, offset)?);
                (!value.is_nan() && value > 0.0 && value < MAX_FLOAT_AMOUNT).then_some(value)
            }
            AmountEncoding::I64Cents => {
                let raw = i64::from_le_bytes(read_array(data, offset)?);
                (raw > 0 && (raw as u64) < MAX_CENTS).then(|| raw as f64 / 100.0)
            }
        }
    }
}

/// A successfully decoded amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodedAmount {
    /// The monetary value.
    pub value: f64,
    /// Which encoding produced it.
    pub encoding: AmountEncoding,
}

/// Try each encoding in [`AmountEncoding::PRIORITY`] order.
///
/// Returns `None` when no encoding yields a plausible value.
pub fn decode_amount(data: &[u8], offset: usize) -> Option<DecodedAmount> {
    if offset >= data.len() {
        return None;
    }
    AmountEncoding::PRIORITY.iter().find_map(|&encoding| {
        encoding
            .try_decode(data, offset)
            .map(|value| DecodedAmount { value, encoding })
    })
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}
