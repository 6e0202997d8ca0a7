//! Currency pattern table: the identifiers a scan looks for.
//!
//! Each requested code becomes a [`CurrencyIdentifier`] carrying its ASCII
//! byte pattern and, for registered currencies, a 16-bit numeric alias. The
//! table keeps request order; that order is the tie-break when more than one
//! pattern could match at the same offset.

use std::fmt;

use crate::catalog::CurrencyCatalog;
use crate::error::{PatternError, Result};

/// A currency code with its two byte-level representations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CurrencyIdentifier {
    code: String,
    ascii: Vec<u8>,
    numeric: Option<u16>,
}

impl CurrencyIdentifier {
    /// Create an identifier from a code and an optional numeric alias.
    pub fn new(code: &str, numeric: Option<u16>) -> Self {
        Self {
            code: code.to_string(),
            ascii: code.as_bytes().to_vec(),
            numeric,
        }
    }

    /// The currency code, e.g. `"USD"`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The ASCII byte pattern.
    pub fn ascii(&self) -> &[u8] {
        &self.ascii
    }

    /// The numeric alias, if registered.
    pub fn numeric(&self) -> Option<u16> {
        self.numeric
    }

    /// Whether the ASCII pattern occurs at `offset` in `data`.
    pub fn matches_ascii(&self, data: &[u8], offset: usize) -> bool {
        let end = offset + self.ascii.len();
        end <= data.len() && data[offset..end] == self.ascii[..]
    }
}

impl fmt::Debug for CurrencyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.numeric {
            Some(n) => write!(
                f,
                "CurrencyIdentifier({} ascii={} numeric={:04x})",
                self.code,
                hex::encode(&self.ascii),
                n
            ),
            None => write!(
                f,
                "CurrencyIdentifier({} ascii={})",
                self.code,
                hex::encode(&self.ascii)
            ),
        }
    }
}

impl fmt::Display for CurrencyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Ordered, append-only set of currency identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTable {
    identifiers: Vec<CurrencyIdentifier>,
}

impl PatternTable {
    /// Build a table using the default currency registry.
    pub fn build<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build_with(codes, &CurrencyCatalog::default())
    }

    /// Build a table, resolving numeric aliases through `catalog`.
    ///
    /// Duplicate codes keep their first position. Fails with
    /// [`PatternError::EmptyCurrencySet`] when no codes are given.
    pub fn build_with<I, S>(codes: I, catalog: &CurrencyCatalog) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self {
            identifiers: Vec::new(),
        };
        table.extend_with(codes, catalog);

        if table.identifiers.is_empty() {
            return Err(PatternError::EmptyCurrencySet);
        }
        Ok(table)
    }

    /// Append codes not already present, preserving existing order.
    ///
    /// Empty codes are skipped: an empty pattern would match at every offset.
    /// Returns the number of identifiers added.
    pub fn extend_with<I, S>(&mut self, codes: I, catalog: &CurrencyCatalog) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.identifiers.len();
        for code in codes {
            let code = code.as_ref();
            if code.is_empty() || self.contains(code) {
                continue;
            }
            self.identifiers
                .push(CurrencyIdentifier::new(code, catalog.numeric_alias(code)));
        }
        self.identifiers.len() - before
    }

    /// Whether `code` is in the table.
    pub fn contains(&self, code: &str) -> bool {
        self.identifiers.iter().any(|id| id.code == code)
    }

    /// Whether the table covers exactly the given codes (ignoring order and repeats).
    pub fn covers_exactly<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        codes.iter().all(|c| self.contains(c.as_ref()))
            && self
                .identifiers
                .iter()
                .all(|id| codes.iter().any(|c| c.as_ref() == id.code))
    }

    /// Identifiers in match priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, CurrencyIdentifier> {
        self.identifiers.iter()
    }

    /// Look up an identifier by code.
    pub fn get(&self, code: &str) -> Option<&CurrencyIdentifier> {
        self.identifiers.iter().find(|id| id.code == code)
    }

    /// The first identifier (in table order) whose numeric alias is `value`.
    pub fn find_numeric(&self, value: u16) -> Option<&CurrencyIdentifier> {
        self.identifiers.iter().find(|id| id.numeric == Some(value))
    }

    /// The codes in table order.
    pub fn codes(&self) -> Vec<&str> {
        self.identifiers.iter().map(|id| id.code.as_str()).collect()
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Always false for a successfully built table.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl<'a> IntoIterator for &'a PatternTable {
    type Item = &'a CurrencyIdentifier;
    type IntoIter = std::slice::Iter<'a, CurrencyIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
