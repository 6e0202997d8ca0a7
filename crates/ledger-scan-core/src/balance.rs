//! Balance aggregation: running per-currency statistics for one session.
//!
//! Recorded amounts are never un-recorded. The sample of raw amounts keeps the
//! first [`MAX_SAMPLE_AMOUNTS`] observations and silently drops the rest.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::CurrencyCatalog;

/// Cap on the number of raw amounts kept per currency.
pub const MAX_SAMPLE_AMOUNTS: usize = 1000;

/// Running statistics for a single currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyBalance {
    /// Currency code.
    pub currency: String,

    /// Sum of every recorded amount.
    pub total_amount: f64,

    /// Number of recorded amounts.
    pub transaction_count: u64,

    /// `total_amount / transaction_count`, zero before the first record.
    pub average_transaction: f64,

    /// Largest recorded amount.
    pub largest_transaction: f64,

    /// Smallest recorded amount. `+inf` until the first record.
    pub smallest_transaction: f64,

    /// The first recorded amounts, oldest first.
    pub amounts: Vec<f64>,

    /// Display name of the ledger account.
    pub account_name: String,

    /// When this balance was last updated (Unix ms).
    pub last_updated: i64,
}

impl CurrencyBalance {
    /// Create an empty balance.
    pub fn new(currency: String, account_name: String, now: i64) -> Self {
        Self {
            currency,
            total_amount: 0.0,
            transaction_count: 0,
            average_transaction: 0.0,
            largest_transaction: 0.0,
            smallest_transaction: f64::INFINITY,
            amounts: Vec::new(),
            account_name,
            last_updated: now,
        }
    }

    /// Fold one amount into the statistics.
    pub fn record(&mut self, amount: f64, now: i64) {
        self.total_amount += amount;
        self.transaction_count += 1;

        if self.amounts.len() < MAX_SAMPLE_AMOUNTS {
            self.amounts.push(amount);
        }

        self.average_transaction = self.total_amount / self.transaction_count as f64;

        if amount > self.largest_transaction {
            self.largest_transaction = amount;
        }
        if amount < self.smallest_transaction {
            self.smallest_transaction = amount;
        }
        self.last_updated = now;
    }

    /// Whether any amount has been recorded.
    pub fn has_transactions(&self) -> bool {
        self.transaction_count > 0
    }

    /// The smallest amount, once one has been recorded.
    pub fn smallest(&self) -> Option<f64> {
        self.has_transactions().then_some(self.smallest_transaction)
    }
}

/// Per-currency balances keyed by currency code.
pub type BalanceMap = BTreeMap<String, CurrencyBalance>;

/// Owns the balance map of one scan session.
#[derive(Debug, Clone)]
pub struct BalanceAggregator {
    balances: BalanceMap,
    catalog: Arc<CurrencyCatalog>,
}

impl BalanceAggregator {
    /// Create an aggregator using the default currency registry for account names.
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(CurrencyCatalog::default()))
    }

    /// Create an aggregator resolving account names through `catalog`.
    pub fn with_catalog(catalog: Arc<CurrencyCatalog>) -> Self {
        Self {
            balances: BalanceMap::new(),
            catalog,
        }
    }

    /// Record an amount for `currency`, stamped with the current time.
    pub fn record(&mut self, currency: &str, amount: f64) {
        self.record_at(currency, amount, now_millis());
    }

    /// Record an amount for `currency` at time `now`.
    pub fn record_at(&mut self, currency: &str, amount: f64, now: i64) {
        let catalog = &self.catalog;
        self.balances
            .entry(currency.to_string())
            .or_insert_with(|| {
                CurrencyBalance::new(currency.to_string(), catalog.account_name(currency), now)
            })
            .record(amount, now);
    }

    /// Balance for one currency.
    pub fn get(&self, currency: &str) -> Option<&CurrencyBalance> {
        self.balances.get(currency)
    }

    /// All balances.
    pub fn balances(&self) -> &BalanceMap {
        &self.balances
    }

    /// Clone of all balances.
    pub fn snapshot(&self) -> BalanceMap {
        self.balances.clone()
    }

    /// Balances in dashboard order: USD, then EUR, then by total descending.
    pub fn ordered(&self) -> Vec<&CurrencyBalance> {
        let mut list: Vec<_> = self.balances.values().collect();
        list.sort_by(|a, b| dashboard_order(a, b));
        list
    }

    /// Total number of recorded amounts across all currencies.
    pub fn total_transactions(&self) -> u64 {
        self.balances.values().map(|b| b.transaction_count).sum()
    }

    /// Number of currencies seen so far.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Default for BalanceAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn dashboard_order(a: &CurrencyBalance, b: &CurrencyBalance) -> Ordering {
    let rank = |c: &CurrencyBalance| match c.currency.as_str() {
        "USD" => 0,
        "EUR" => 1,
        _ => 2,
    };
    rank(a).cmp(&rank(b)).then_with(|| {
        b.total_amount
            .partial_cmp(&a.total_amount)
            .unwrap_or(Ordering::Equal)
    })
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
