//! Exchange rate table
//!
//! Maps a currency code to the multiplier that converts an amount in the
//! dataset's base currency into that currency:
//! `converted = base_amount * rate`.
//!
//! The reference input is a CSV file whose first column is the currency code
//! and which carries a `Rate` column:
//!
//! ```text
//! Currency,Rate
//! EUR,0.93
//! GBP,0.8
//! INR,82.95
//! ```

use crate::error::{EtlError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use hashbrown::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header of the rate column in the reference input
pub const RATE_COLUMN: &str = "Rate";

/// Currency code to conversion rate, immutable once loaded for a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Create an empty rate table
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Add a rate, replacing any earlier rate for the same code
    pub fn add_rate(&mut self, code: &str, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EtlError::MalformedValue {
                location: format!("rate for {}", code),
                value: rate.to_string(),
            });
        }

        self.rates.insert(normalize_code(code), rate);
        Ok(())
    }

    /// Rate for a currency code (case-insensitive)
    pub fn get_rate(&self, code: &str) -> Result<f64> {
        self.rates
            .get(&normalize_code(code))
            .copied()
            .ok_or_else(|| EtlError::MissingRate(normalize_code(code)))
    }

    /// Check if a rate is available
    pub fn has_rate(&self, code: &str) -> bool {
        self.rates.contains_key(&normalize_code(code))
    }

    /// Known currency codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Parse a rate table from CSV data
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::parse(reader, "rate input")
    }

    fn parse<R: Read>(reader: R, location: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| csv_error(location, e))?
            .clone();
        let rate_idx = Self::find_rate_column(&headers)?;

        let mut table = Self::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(location, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            // First column is the key, whatever its header says
            let code = record.get(0).unwrap_or_default();
            if code.is_empty() {
                continue;
            }

            let raw = record.get(rate_idx).unwrap_or_default();
            let malformed = || EtlError::MalformedValue {
                location: format!("{} line {}", location, line),
                value: raw.to_string(),
            };
            let rate: f64 = raw.parse().map_err(|_| malformed())?;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(malformed());
            }

            if table.rates.insert(normalize_code(code), rate).is_some() {
                log::debug!("Rate for {} redefined at {} line {}", code, location, line);
            }
        }

        Ok(table)
    }

    fn find_rate_column(headers: &StringRecord) -> Result<usize> {
        if headers.len() < 2 {
            return Err(EtlError::Schema(format!(
                "rate input needs a currency column and a {} column, found {} column(s)",
                RATE_COLUMN,
                headers.len()
            )));
        }

        headers
            .iter()
            .skip(1)
            .position(|h| h == RATE_COLUMN)
            .map(|i| i + 1)
            .ok_or_else(|| EtlError::Schema(format!("rate input has no {} column", RATE_COLUMN)))
    }
}

/// Load the rate table from a CSV file
pub fn load_rates(path: &Path) -> Result<RateTable> {
    let location = path.display().to_string();
    let file = File::open(path).map_err(|e| EtlError::SourceUnavailable {
        location: location.clone(),
        reason: e.to_string(),
    })?;

    let table = RateTable::parse(file, &location)?;
    log::debug!("Loaded {} exchange rates from {}", table.len(), location);
    Ok(table)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn csv_error(location: &str, e: csv::Error) -> EtlError {
    if e.is_io_error() {
        EtlError::SourceUnavailable {
            location: location.to_string(),
            reason: e.to_string(),
        }
    } else {
        EtlError::Schema(format!("{}: {}", location, e))
    }
}
