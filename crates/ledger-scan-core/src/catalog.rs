//! Currency catalog: static registry data passed into the pattern table builder.
//!
//! The catalog maps a 3-letter currency code to its ISO-4217-style numeric
//! alias and a human-readable account name. It is plain immutable data; a
//! session receives it through configuration rather than reading a global.

use serde::{Deserialize, Serialize};

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// The 3-letter currency code.
    pub code: String,
    /// Registered numeric alias, matched as a big-endian u16.
    pub numeric: Option<u16>,
    /// Display name of the ledger account for this currency.
    pub account_name: String,
}

impl CatalogEntry {
    /// Create a new entry.
    pub fn new(code: &str, numeric: Option<u16>, account_name: &str) -> Self {
        Self {
            code: code.to_string(),
            numeric,
            account_name: account_name.to_string(),
        }
    }
}

/// Ordered registry of well-known currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCatalog {
    entries: Vec<CatalogEntry>,
}

/// The default registry: (code, numeric alias, account name).
const DEFAULT_REGISTRY: [(&str, u16, &str); 15] = [
    ("USD", 840, "US Dollars Account"),
    ("EUR", 978, "Euros Account"),
    ("GBP", 826, "Pound Sterling Account"),
    ("CAD", 124, "Canadian Dollars Account"),
    ("AUD", 36, "Australian Dollars Account"),
    ("JPY", 392, "Japanese Yen Account"),
    ("CHF", 756, "Swiss Francs Account"),
    ("CNY", 156, "Chinese Yuan Account"),
    ("INR", 356, "Indian Rupees Account"),
    ("MXN", 484, "Mexican Pesos Account"),
    ("BRL", 986, "Brazilian Reals Account"),
    ("RUB", 643, "Russian Rubles Account"),
    ("KRW", 410, "South Korean Won Account"),
    ("SGD", 702, "Singapore Dollars Account"),
    ("HKD", 344, "Hong Kong Dollars Account"),
];

impl CurrencyCatalog {
    /// Create a catalog from explicit entries.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// An empty catalog: every code is matched by ASCII text only.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Look up an entry by code.
    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// The registered numeric alias for a code, if any.
    pub fn numeric_alias(&self, code: &str) -> Option<u16> {
        self.get(code).and_then(|e| e.numeric)
    }

    /// Account name for a code, falling back to `"<CODE> Account"`.
    pub fn account_name(&self, code: &str) -> String {
        match self.get(code) {
            Some(entry) => entry.account_name.clone(),
            None => format!("{code} Account"),
        }
    }

    /// All registered codes, in registry order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.code.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CurrencyCatalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_REGISTRY
                .iter()
                .map(|(code, numeric, name)| CatalogEntry::new(code, Some(*numeric), name))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let catalog = CurrencyCatalog::default();
        assert_eq!(catalog.len(), 15);
        assert_eq!(catalog.numeric_alias("USD"), Some(840));
        assert_eq!(catalog.numeric_alias("AUD"), Some(36));
        assert_eq!(catalog.account_name("CHF"), "Swiss Francs Account");
        assert_eq!(catalog.codes().next(), Some("USD"));
    }

    #[test]
    fn test_unknown_code_fallback() {
        let catalog = CurrencyCatalog::default();
        assert_eq!(catalog.numeric_alias("XAU"), None);
        assert_eq!(catalog.account_name("XAU"), "XAU Account");
    }

    #[test]
    fn test_catalog_json_shape() {
        let catalog = CurrencyCatalog::new(vec![CatalogEntry::new("BTC", None, "Bitcoin Ledger")]);
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(
            json,
            r#"[{"code":"BTC","numeric":null,"accountName":"Bitcoin Ledger"}]"#
        );

        let back: CurrencyCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
