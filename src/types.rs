//! Core record and dataset types

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};

/// Header of the bank name column
pub const NAME_COLUMN: &str = "Name";

/// Market capitalization amount, in billions of some currency
pub type Amount = f64;

/// Column header for a currency, e.g. `MC_USD_Billion`
pub fn currency_column(code: &str) -> String {
    format!("MC_{}_Billion", code)
}

/// A bank and its market capitalization in the base currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub name: String,
    pub market_cap: Amount,
}

impl BankRecord {
    pub fn new(name: impl Into<String>, market_cap: Amount) -> Self {
        Self {
            name: name.into(),
            market_cap,
        }
    }
}

/// A bank record with one converted amount per target currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub market_cap: Amount,
    /// Converted amounts, in the dataset's currency order
    pub converted: Vec<Amount>,
}

impl NormalizedRecord {
    /// Base amount followed by every converted amount
    pub fn amounts(&self) -> impl Iterator<Item = Amount> + '_ {
        std::iter::once(self.market_cap).chain(self.converted.iter().copied())
    }
}

/// Ordered, deduplicated set of normalized records and their column layout
///
/// Record order is the ranking order of the source document and is what
/// "top N" queries against the persisted table rely on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    base_currency: String,
    currencies: Vec<String>,
    records: Vec<NormalizedRecord>,
}

impl Dataset {
    /// Build a dataset, checking every record carries one amount per currency
    pub fn new(
        base_currency: impl Into<String>,
        currencies: Vec<String>,
        records: Vec<NormalizedRecord>,
    ) -> Result<Self> {
        if let Some(bad) = records.iter().find(|r| r.converted.len() != currencies.len()) {
            return Err(EtlError::Schema(format!(
                "record {:?} has {} converted amounts, expected {}",
                bad.name,
                bad.converted.len(),
                currencies.len()
            )));
        }

        Ok(Self {
            base_currency: base_currency.into(),
            currencies,
            records,
        })
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Target currency codes, in column order
    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column headers in canonical order: name, base currency, then targets
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.currencies.len() + 2);
        columns.push(NAME_COLUMN.to_string());
        columns.push(currency_column(&self.base_currency));
        columns.extend(self.currencies.iter().map(|c| currency_column(c)));
        columns
    }

    /// Converted amount for one record and currency code
    pub fn amount(&self, index: usize, code: &str) -> Option<Amount> {
        let record = self.records.get(index)?;
        if code.eq_ignore_ascii_case(&self.base_currency) {
            return Some(record.market_cap);
        }
        let pos = self
            .currencies
            .iter()
            .position(|c| c.eq_ignore_ascii_case(code))?;
        record.converted.get(pos).copied()
    }
}
