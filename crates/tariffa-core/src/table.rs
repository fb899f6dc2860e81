//! The regional price table: code → (description, price).

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of the regional tariff sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub code: String,
    pub description: String,
    pub price: Decimal,
}

impl PriceEntry {
    pub fn new(code: impl Into<String>, description: impl Into<String>, price: Decimal) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            price,
        }
    }
}

/// Immutable price table, loaded once and shared by reference.
///
/// Entries keep their source order; lookups go through an exact-code index.
/// When the source repeats a code, the first row wins.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
    index: HashMap<String, usize>,
}

/// Summary statistics for a PriceTable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub entries: usize,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub mean_price: Option<Decimal>,
}

impl PriceTable {
    pub fn new(rows: impl IntoIterator<Item = PriceEntry>) -> Self {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for row in rows {
            if index.contains_key(&row.code) {
                warn!(code = %row.code, "duplicate code in price table, keeping first row");
                continue;
            }
            index.insert(row.code.clone(), entries.len());
            entries.push(row);
        }
        Self { entries, index }
    }

    /// Exact-match lookup.
    pub fn get(&self, code: &str) -> Option<&PriceEntry> {
        self.position(code).map(|i| &self.entries[i])
    }

    /// Row position of `code` in table order.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    /// Entry at a row position.
    pub fn entry(&self, position: usize) -> Option<&PriceEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> TableSummary {
        let prices = self.entries.iter().map(|e| e.price);
        let min_price = prices.clone().min();
        let max_price = prices.clone().max();
        let mean_price = if self.is_empty() {
            None
        } else {
            let sum: Decimal = prices.sum();
            Some((sum / Decimal::from(self.entries.len())).round_dp(2))
        };
        TableSummary {
            entries: self.entries.len(),
            min_price,
            max_price,
            mean_price,
        }
    }
}
