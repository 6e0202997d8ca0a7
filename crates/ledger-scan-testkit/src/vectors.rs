//! Golden scan scenarios with known balances.
//!
//! Each scenario is a list of chunks fed to a fresh session in order, plus the
//! balances the session must end with.

use anyhow::{ensure, Context};
use serde::Serialize;

use ledger_scan::{Chunk, ProgressResult, ScanSession, SessionConfig};

use crate::fixtures::RecordBuilder;

/// Expected state of one currency after a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedBalance {
    /// Currency code.
    pub currency: &'static str,
    /// Sum of all amounts.
    pub total_amount: f64,
    /// Number of records.
    pub transaction_count: u64,
    /// Length of the retained amount sample.
    pub sample_len: usize,
}

/// A golden scenario.
#[derive(Debug, Clone)]
pub struct GoldenScenario {
    /// Human-readable name.
    pub name: &'static str,
    /// Currencies requested with every chunk.
    pub currencies: &'static [&'static str],
    /// Session configuration.
    pub config: SessionConfig,
    /// Chunk payloads, fed at consecutive offsets.
    pub chunks: Vec<Vec<u8>>,
    /// Balances after the last chunk. Currencies not listed must be absent.
    pub expected: Vec<ExpectedBalance>,
}

/// Get all golden scenarios.
pub fn all_scenarios() -> Vec<GoldenScenario> {
    let eur_chunk = RecordBuilder::new().ascii_u32("EUR", 250).finish();
    let usd_chunk = (0..250)
        .fold(RecordBuilder::new(), |b, _| b.ascii_u32("USD", 100))
        .finish();

    let mut straddling = RecordBuilder::new().noise(11, 40).ascii_u32("GBP", 4_200).finish();
    let second_half = straddling.split_off(42);

    vec![
        GoldenScenario {
            name: "USD u32 cents at offset zero",
            currencies: &["USD"],
            config: SessionConfig::default(),
            chunks: vec![RecordBuilder::new().ascii_u32("USD", 100).finish()],
            expected: vec![ExpectedBalance {
                currency: "USD",
                total_amount: 1.00,
                transaction_count: 1,
                sample_len: 1,
            }],
        },
        GoldenScenario {
            name: "EUR across two chunks",
            currencies: &["EUR"],
            config: SessionConfig::default(),
            chunks: vec![eur_chunk.clone(), eur_chunk],
            expected: vec![ExpectedBalance {
                currency: "EUR",
                total_amount: 5.00,
                transaction_count: 2,
                sample_len: 2,
            }],
        },
        GoldenScenario {
            name: "Ten thousand zero bytes",
            currencies: &["USD", "EUR"],
            config: SessionConfig::default(),
            chunks: vec![vec![0u8; 10_000]],
            expected: vec![],
        },
        GoldenScenario {
            name: "1500 USD records cap the sample",
            currencies: &["USD"],
            config: SessionConfig::default(),
            chunks: vec![usd_chunk; 6],
            expected: vec![ExpectedBalance {
                currency: "USD",
                total_amount: 1_500.00,
                transaction_count: 1_500,
                sample_len: 1_000,
            }],
        },
        GoldenScenario {
            name: "JPY numeric alias with f64 amount",
            currencies: &["JPY"],
            config: SessionConfig::default(),
            chunks: vec![RecordBuilder::new()
                .raw(&392u16.to_be_bytes())
                .raw(&1536.0f64.to_le_bytes())
                .finish()],
            expected: vec![ExpectedBalance {
                currency: "JPY",
                total_amount: 1_536.0,
                transaction_count: 1,
                sample_len: 1,
            }],
        },
        GoldenScenario {
            name: "Record straddling a boundary without carry",
            currencies: &["GBP"],
            config: SessionConfig::default(),
            chunks: vec![straddling.clone(), second_half.clone()],
            expected: vec![],
        },
        GoldenScenario {
            name: "Record straddling a boundary with carry",
            currencies: &["GBP"],
            config: SessionConfig {
                carry_tail: true,
                ..SessionConfig::default()
            },
            chunks: vec![straddling, second_half],
            expected: vec![ExpectedBalance {
                currency: "GBP",
                total_amount: 42.00,
                transaction_count: 1,
                sample_len: 1,
            }],
        },
    ]
}

/// The chunks of a scenario at their absolute offsets.
pub fn scenario_chunks(scenario: &GoldenScenario) -> Vec<Chunk> {
    let mut offset = 0u64;
    scenario
        .chunks
        .iter()
        .map(|data| {
            let chunk = Chunk::new(offset, data.clone());
            offset = chunk.end_offset();
            chunk
        })
        .collect()
}

/// Feed a scenario through a fresh session.
pub fn run_scenario(scenario: &GoldenScenario) -> anyhow::Result<ProgressResult> {
    let mut session = ScanSession::new(scenario.config.clone());
    for (index, chunk) in scenario_chunks(scenario).iter().enumerate() {
        session
            .process_chunk(chunk, scenario.currencies)
            .with_context(|| {
                format!(
                    "scenario '{}' chunk {} ({}...)",
                    scenario.name,
                    index,
                    hex::encode(&chunk.as_slice()[..chunk.len().min(8)])
                )
            })?;
    }
    Ok(session.snapshot())
}

/// Check a final snapshot against a scenario's expectations.
pub fn check_scenario(scenario: &GoldenScenario, result: &ProgressResult) -> anyhow::Result<()> {
    ensure!(
        result.balances.len() == scenario.expected.len(),
        "scenario '{}': expected {} currencies, got {}",
        scenario.name,
        scenario.expected.len(),
        result.balances.len()
    );
    for expected in &scenario.expected {
        let balance = result
            .balances
            .get(expected.currency)
            .with_context(|| format!("scenario '{}': {} missing", scenario.name, expected.currency))?;
        ensure!(
            (balance.total_amount - expected.total_amount).abs() < 1e-9,
            "scenario '{}': {} total {} != {}",
            scenario.name,
            expected.currency,
            balance.total_amount,
            expected.total_amount
        );
        ensure!(
            balance.transaction_count == expected.transaction_count,
            "scenario '{}': {} count {} != {}",
            scenario.name,
            expected.currency,
            balance.transaction_count,
            expected.transaction_count
        );
        ensure!(
            balance.amounts.len() == expected.sample_len,
            "scenario '{}': {} sample length {} != {}",
            scenario.name,
            expected.currency,
            balance.amounts.len(),
            expected.sample_len
        );
    }
    Ok(())
}

/// Run and check every golden scenario.
///
/// Returns (name, passed, detail) per scenario; detail is the final balances
/// as JSON on success and the error chain on failure.
pub fn verify_all_scenarios() -> Vec<(String, bool, String)> {
    all_scenarios()
        .iter()
        .map(|scenario| {
            let outcome = run_scenario(scenario).and_then(|result| {
                check_scenario(scenario, &result)?;
                Ok(serde_json::to_string(&result.balances)?)
            });
            match outcome {
                Ok(json) => (scenario.name.to_string(), true, json),
                Err(e) => (scenario.name.to_string(), false, format!("{e:#}")),
            }
        })
        .collect()
}
