//! Test fixtures and helpers.
//!
//! [`RecordBuilder`] lays out a synthetic dump byte by byte and remembers the
//! records it wrote, so tests can compare a scan against what was planted.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ledger_scan::{Chunk, ScanSession, SessionConfig};
use ledger_scan_core::scanner::TAIL_RESERVE;
use ledger_scan_core::BalanceMap;

/// Zero bytes appended by [`RecordBuilder::finish`] so the last record is scanned.
pub const TRAILING_PADDING: usize = TAIL_RESERVE + 5;

/// A record planted by a [`RecordBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlantedRecord {
    /// Currency code.
    pub currency: String,
    /// Offset of the identifier.
    pub offset: usize,
    /// Amount the scanner should decode.
    pub amount: f64,
}

/// Builds synthetic ledger dumps.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    data: Vec<u8>,
    planted: Vec<PlantedRecord>,
}

impl RecordBuilder {
    /// Start an empty dump.
    pub fn new() -> Self {
        Self::default()
    }

    /// ASCII code, u32 cents, then four filler bytes.
    pub fn ascii_u32(mut self, code: &str, cents: u32) -> Self {
        assert!(cents > 0, "zero cents never decode");
        self.plant(code, f64::from(cents) / 100.0);
        self.data.extend_from_slice(code.as_bytes());
        self.data.extend_from_slice(&cents.to_le_bytes());
        self.data.extend_from_slice(&[0u8; 4]);
        self
    }

    /// ASCII code followed by an f64.
    ///
    /// The value's low 32-bit word must be zero, otherwise the u32 reading wins.
    pub fn ascii_f64(mut self, code: &str, value: f64) -> Self {
        let bytes = value.to_le_bytes();
        assert_eq!(&bytes[..4], &[0, 0, 0, 0], "{value} would decode as u32 cents");
        self.plant(code, value);
        self.data.extend_from_slice(code.as_bytes());
        self.data.extend_from_slice(&bytes);
        self
    }

    /// Big-endian numeric alias, u32 cents, then four filler bytes.
    pub fn numeric_u32(mut self, code: &str, alias: u16, cents: u32) -> Self {
        assert!(cents > 0, "zero cents never decode");
        self.plant(code, f64::from(cents) / 100.0);
        self.data.extend_from_slice(&alias.to_be_bytes());
        self.data.extend_from_slice(&cents.to_le_bytes());
        self.data.extend_from_slice(&[0u8; 4]);
        self
    }

    /// Raw bytes that are not a record.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// `len` zero bytes. The scanner strides over these four at a time.
    pub fn padding(mut self, len: usize) -> Self {
        self.data.resize(self.data.len() + len, 0);
        self
    }

    /// `len` lowercase letters from a seeded generator.
    ///
    /// Lowercase text never matches a code or a registered alias.
    pub fn noise(mut self, seed: u64, len: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        self.data
            .extend((0..len).map(|_| rng.gen_range(b'a'..=b'z')));
        self
    }

    /// Records planted so far, in offset order.
    pub fn planted(&self) -> &[PlantedRecord] {
        &self.planted
    }

    /// Bytes written so far, without trailing padding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The dump with [`TRAILING_PADDING`] zero bytes appended.
    pub fn finish(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        out.resize(out.len() + TRAILING_PADDING, 0);
        out
    }

    /// Expected balances from the planted records.
    pub fn expected_balances(&self) -> BalanceMap {
        let mut aggregator = ledger_scan_core::BalanceAggregator::new();
        for record in &self.planted {
            aggregator.record(&record.currency, record.amount);
        }
        aggregator.snapshot()
    }

    fn plant(&mut self, code: &str, amount: f64) {
        self.planted.push(PlantedRecord {
            currency: code.to_string(),
            offset: self.data.len(),
            amount,
        });
    }
}

/// Cut `data` into consecutive chunks of at most `chunk_size` bytes.
pub fn split_chunks(data: &[u8], chunk_size: usize) -> Vec<Chunk> {
    assert!(chunk_size > 0, "chunk size must be positive");
    data.chunks(chunk_size)
        .scan(0u64, |offset, piece| {
            let chunk = Chunk::new(*offset, piece.to_vec());
            *offset = chunk.end_offset();
            Some(chunk)
        })
        .collect()
}

/// A session plus the currencies it is fed with.
pub struct SessionFixture {
    /// The session under test.
    pub session: ScanSession,
    /// Requested currencies, sent with every chunk.
    pub currencies: Vec<String>,
}

impl SessionFixture {
    /// Default configuration, default catalog.
    pub fn new<S: AsRef<str>>(currencies: &[S]) -> Self {
        Self::with_config(SessionConfig::default(), currencies)
    }

    /// Tail carry enabled.
    pub fn carrying<S: AsRef<str>>(currencies: &[S]) -> Self {
        Self::with_config(
            SessionConfig {
                carry_tail: true,
                ..SessionConfig::default()
            },
            currencies,
        )
    }

    /// Custom configuration.
    pub fn with_config<S: AsRef<str>>(config: SessionConfig, currencies: &[S]) -> Self {
        Self {
            session: ScanSession::new(config),
            currencies: currencies.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Feed `data` in chunks of `chunk_size` and return the final balances.
    pub fn feed(&mut self, data: &[u8], chunk_size: usize) -> ledger_scan::Result<BalanceMap> {
        for chunk in split_chunks(data, chunk_size) {
            self.session.process_chunk(&chunk, &self.currencies)?;
        }
        Ok(self.session.balances().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_offsets() {
        let builder = RecordBuilder::new()
            .noise(1, 5)
            .ascii_u32("USD", 100)
            .numeric_u32("EUR", 978, 250);

        let planted = builder.planted();
        assert_eq!(planted[0].offset, 5);
        assert_eq!(planted[1].offset, 16);
        assert_eq!(builder.len(), 26);
        assert_eq!(builder.finish().len(), 26 + TRAILING_PADDING);
    }

    #[test]
    fn test_noise_is_seeded() {
        let a = RecordBuilder::new().noise(7, 64).finish();
        let b = RecordBuilder::new().noise(7, 64).finish();
        let c = RecordBuilder::new().noise(8, 64).finish();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a[..64].iter().all(u8::is_ascii_lowercase));
    }

    #[test]
    fn test_split_chunks_offsets() {
        let chunks = split_chunks(&[0u8; 10], 4);
        let offsets: Vec<_> = chunks.iter().map(|c| (c.offset, c.len())).collect();
        assert_eq!(offsets, vec![(0, 4), (4, 4), (8, 2)]);
    }

    #[test]
    fn test_whole_buffer_matches_planted() {
        let builder = RecordBuilder::new()
            .ascii_u32("USD", 1_234)
            .noise(3, 17)
            .ascii_f64("GBP", 12.5)
            .noise(4, 3)
            .numeric_u32("JPY", 392, 99);

        let mut fixture = SessionFixture::new(&["USD", "GBP", "JPY"]);
        let data = builder.finish();
        let balances = fixture.feed(&data, data.len()).unwrap();

        let expected = builder.expected_balances();
        assert_eq!(balances.len(), expected.len());
        for (code, balance) in &expected {
            assert_eq!(balances[code].total_amount, balance.total_amount);
            assert_eq!(balances[code].transaction_count, balance.transaction_count);
        }
    }

    #[test]
    fn test_carrying_fixture_finds_straddling_records() {
        let builder = RecordBuilder::new().noise(9, 30).ascii_u32("EUR", 500);
        let data = builder.finish();

        let mut fixture = SessionFixture::carrying(&["EUR"]);
        let balances = fixture.feed(&data, 32).unwrap();
        assert_eq!(balances["EUR"].total_amount, 5.0);
    }
}
