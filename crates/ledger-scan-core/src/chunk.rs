//! Chunk: one contiguous slice of the input file.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An immutable byte buffer and the absolute file offset it starts at.
///
/// The offset is informational: scanning works on chunk-relative indices.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Absolute offset of the first byte in the source file.
    pub offset: u64,
    /// The chunk contents.
    pub data: Bytes,
}

impl Chunk {
    /// Create a chunk.
    pub fn new(offset: u64, data: impl Into<Bytes>) -> Self {
        Self {
            offset,
            data: data.into(),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the chunk has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The absolute offset one past the last byte, saturating at `u64::MAX`.
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.data.len() as u64)
    }

    /// Translate a chunk-relative index to an absolute file offset, saturating at `u64::MAX`.
    pub fn absolute(&self, relative: usize) -> u64 {
        self.offset.saturating_add(relative as u64)
    }

    /// The raw bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview = &self.data[..self.data.len().min(8)];
        write!(
            f,
            "Chunk(offset={}, len={}, head={})",
            self.offset,
            self.data.len(),
            hex::encode(preview)
        )
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
