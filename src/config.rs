//! Run configuration
//!
//! Every field has a default, so an empty TOML file (or no file at all) gives
//! the standard run against the archived list of largest banks:
//!
//! ```toml
//! data_url = "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks"
//! base_currency = "USD"
//! currencies = ["GBP", "EUR", "INR"]
//! rates_path = "exchange_rate.csv"
//! csv_path = "./Largest_banks_data.csv"
//! db_path = "Banks.db"
//! table_name = "Largest_banks"
//! log_path = "code_log.txt"
//! ```
//!
//! An empty `log_path` turns the progress log file off.

use crate::error::{EtlError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder replaced with the table name in configured queries
pub const TABLE_PLACEHOLDER: &str = "{table}";

/// Configuration of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Location handed to the document source
    pub data_url: String,
    /// Currency of the amounts in the source document
    pub base_currency: String,
    /// Target currencies, in output column order
    pub currencies: Vec<String>,
    /// Exchange rate reference CSV
    pub rates_path: PathBuf,
    /// CSV output file
    pub csv_path: PathBuf,
    /// SQLite database file
    pub db_path: PathBuf,
    /// Table replaced on every run
    pub table_name: String,
    /// Progress log file, `None` to log through `log` only
    ///
    /// Written as an empty string in TOML, which has no null.
    #[serde(with = "optional_path")]
    pub log_path: Option<PathBuf>,
    /// Statements run after loading; `{table}` expands to `table_name`
    pub queries: Vec<String>,
}

mod optional_path {
    use super::*;

    pub fn serialize<S: Serializer>(
        path: &Option<PathBuf>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match path {
            Some(path) => path.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<PathBuf>, D::Error> {
        let path = PathBuf::deserialize(deserializer)?;
        Ok(if path.as_os_str().is_empty() { None } else { Some(path) })
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            data_url: "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks"
                .to_string(),
            base_currency: "USD".to_string(),
            currencies: vec!["GBP".to_string(), "EUR".to_string(), "INR".to_string()],
            rates_path: PathBuf::from("exchange_rate.csv"),
            csv_path: PathBuf::from("./Largest_banks_data.csv"),
            db_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            log_path: Some(PathBuf::from("code_log.txt")),
            queries: vec![
                "SELECT * FROM {table}".to_string(),
                "SELECT AVG(MC_GBP_Billion) FROM {table}".to_string(),
                "SELECT Name FROM {table} LIMIT 5".to_string(),
            ],
        }
    }
}

impl EtlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| EtlError::Config(format!("invalid configuration: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| EtlError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EtlError::Config(e.to_string()))
    }

    /// Check the configuration is usable before any stage runs
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(EtlError::Config("table_name must not be empty".to_string()));
        }

        if self.data_url.trim().is_empty() {
            return Err(EtlError::Config("data_url must not be empty".to_string()));
        }

        for code in std::iter::once(&self.base_currency).chain(&self.currencies) {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(EtlError::Config(format!(
                    "invalid currency code {:?}, expected three letters",
                    code
                )));
            }
        }

        if self
            .currencies
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.base_currency))
        {
            return Err(EtlError::Config(format!(
                "base currency {} cannot also be a target currency",
                self.base_currency
            )));
        }

        Ok(())
    }

    /// Target currencies as string slices
    pub fn currency_codes(&self) -> Vec<&str> {
        self.currencies.iter().map(String::as_str).collect()
    }

    /// Configured queries with the table name filled in
    pub fn expanded_queries(&self) -> Vec<String> {
        self.queries
            .iter()
            .map(|q| q.replace(TABLE_PLACEHOLDER, &self.table_name))
            .collect()
    }
}
