//! Proptest generators for property-based testing.
//!
//! Layouts produced here are unambiguous: every planted record is found by a
//! whole-buffer scan over the default registry, and nothing else is.

use proptest::prelude::*;

use ledger_scan_core::CurrencyCatalog;

use crate::fixtures::RecordBuilder;

/// Codes in the default registry.
pub fn registry_codes() -> Vec<String> {
    CurrencyCatalog::default()
        .codes()
        .map(str::to_string)
        .collect()
}

/// A code from the default registry.
pub fn currency_code() -> impl Strategy<Value = String> {
    prop::sample::select(registry_codes())
}

/// Any amount a u32 record can carry.
pub fn cents() -> impl Strategy<Value = u32> {
    1u32..=u32::MAX
}

/// Lowercase text of at most `max_len` bytes.
pub fn inert_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'z', 0..=max_len)
}

/// Arbitrary bytes of at most `max_len`.
pub fn raw_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// One segment of a generated dump.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// ASCII identifier with u32 cents.
    Ascii { code: String, cents: u32 },
    /// Numeric alias with u32 cents.
    Numeric { code: String, cents: u32 },
    /// Seeded lowercase noise.
    Noise { seed: u64, len: usize },
}

impl Arbitrary for Segment {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            (currency_code(), cents()).prop_map(|(code, cents)| Segment::Ascii { code, cents }),
            (currency_code(), cents()).prop_map(|(code, cents)| Segment::Numeric { code, cents }),
            (any::<u64>(), 0usize..48).prop_map(|(seed, len)| Segment::Noise { seed, len }),
        ]
        .boxed()
    }
}

/// A dump layout of up to `max_segments` segments.
pub fn layout(max_segments: usize) -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec(any::<Segment>(), 0..=max_segments)
}

/// Lay the segments out with a [`RecordBuilder`].
pub fn build_layout(segments: &[Segment]) -> RecordBuilder {
    let catalog = CurrencyCatalog::default();
    segments
        .iter()
        .fold(RecordBuilder::new(), |builder, segment| match segment {
            Segment::Ascii { code, cents } => builder.ascii_u32(code, *cents),
            Segment::Numeric { code, cents } => match catalog.numeric_alias(code) {
                Some(alias) => builder.numeric_u32(code, alias, *cents),
                None => builder.ascii_u32(code, *cents),
            },
            Segment::Noise { seed, len } => builder.noise(*seed, *len),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SessionFixture;
    use ledger_scan_core::{ChunkScanner, PatternTable};

    #[test]
    fn test_registry_codes_follow_catalog_order() {
        let codes = registry_codes();
        assert_eq!(codes.len(), 15);
        assert_eq!(codes[0], "USD");
        assert_eq!(codes[1], "EUR");
    }

    proptest! {
        #[test]
        fn test_whole_buffer_finds_every_planted_record(segments in layout(24)) {
            let builder = build_layout(&segments);
            let table = PatternTable::build(registry_codes()).unwrap();
            let outcome = ChunkScanner::new(&table).detect(&builder.finish());

            let found: Vec<_> = outcome
                .detections
                .iter()
                .map(|d| (d.currency.clone(), d.offset, d.amount.value))
                .collect();
            let planted: Vec<_> = builder
                .planted()
                .iter()
                .map(|r| (r.currency.clone(), r.offset, r.amount))
                .collect();
            prop_assert_eq!(found, planted);
        }

        #[test]
        fn test_carried_chunks_match_whole_buffer(
            segments in layout(24),
            chunk_size in 1usize..160,
        ) {
            let data = build_layout(&segments).finish();

            let mut whole = SessionFixture::new(&registry_codes());
            let expected = whole.feed(&data, data.len()).unwrap();

            let mut chunked = SessionFixture::carrying(&registry_codes());
            let got = chunked.feed(&data, chunk_size).unwrap();

            prop_assert_eq!(got.len(), expected.len());
            for (code, balance) in &expected {
                prop_assert_eq!(got[code].transaction_count, balance.transaction_count);
                prop_assert_eq!(got[code].total_amount, balance.total_amount);
                prop_assert_eq!(&got[code].amounts, &balance.amounts);
            }
        }

        #[test]
        fn test_any_bytes_never_fail(data in raw_bytes(2048), chunk_size in 1usize..512) {
            let mut fixture = SessionFixture::new(&registry_codes());
            prop_assert!(fixture.feed(&data, chunk_size).is_ok());
            prop_assert_eq!(fixture.session.stats().failed_chunks, 0);
        }
    }
}
