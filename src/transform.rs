//! Currency normalization of extracted records

use crate::error::{EtlError, Result};
use crate::rates::RateTable;
use crate::types::{Amount, BankRecord, Dataset, NormalizedRecord};

/// Decimal places kept in converted amounts
pub const DECIMALS: i32 = 2;

/// Round to [`DECIMALS`] places, ties to even on the scaled value
pub fn round_amount(value: Amount) -> Amount {
    let scale = 10f64.powi(DECIMALS);
    (value * scale).round_ties_even() / scale
}

/// Convert every record into each requested currency
///
/// Currency codes are upper-cased and duplicates collapsed, keeping the first
/// position. All codes are checked against `rates` before any conversion, so a
/// missing rate yields no output at all.
pub fn transform(
    records: Vec<BankRecord>,
    rates: &RateTable,
    base_currency: &str,
    currencies: &[&str],
) -> Result<Dataset> {
    let base = base_currency.trim().to_ascii_uppercase();
    let codes = ordered_codes(currencies);

    if codes.contains(&base) {
        return Err(EtlError::Config(format!(
            "target currency {} is the base currency",
            base
        )));
    }

    let factors = codes
        .iter()
        .map(|code| rates.get_rate(code))
        .collect::<Result<Vec<f64>>>()?;

    let normalized = records
        .into_iter()
        .map(|record| NormalizedRecord {
            converted: factors
                .iter()
                .map(|rate| round_amount(record.market_cap * rate))
                .collect(),
            name: record.name,
            market_cap: record.market_cap,
        })
        .collect();

    Dataset::new(base, codes, normalized)
}

fn ordered_codes(currencies: &[&str]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::with_capacity(currencies.len());
    for code in currencies {
        let code = code.trim().to_ascii_uppercase();
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}
