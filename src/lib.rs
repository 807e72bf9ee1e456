//! # bank-etl
//!
//! Extracts the ranked list of the world's largest banks from an HTML page,
//! converts each bank's market capitalization into several currencies, and
//! persists the result to a CSV file and a SQLite table.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bank_etl::prelude::*;
//!
//! # fn main() -> bank_etl::error::Result<()> {
//! let markup = std::fs::read_to_string("largest_banks.html")?;
//! let records = extract(&markup)?;
//!
//! let rates = load_rates(std::path::Path::new("exchange_rate.csv"))?;
//! let dataset = transform(records, &rates, "USD", &["GBP", "EUR", "INR"])?;
//!
//! let mut store = Store::open(std::path::Path::new("Banks.db"))?;
//! store.save(&dataset, "Largest_banks")?;
//! println!("{}", store.query("SELECT Name FROM Largest_banks LIMIT 5")?);
//! store.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod rates;
pub mod transform;
pub mod types;

pub mod prelude {
    //! Commonly used types and functions
    pub use crate::config::EtlConfig;
    pub use crate::error::{EtlError, Result, Stage};
    pub use crate::extract::{extract, DocumentSource, Extractor, FileSource, InMemorySource};
    pub use crate::load::{save_to_file, save_to_table, Store};
    pub use crate::pipeline::{EtlPipeline, RunReport};
    pub use crate::progress::ProgressLog;
    pub use crate::query::{run_query, QueryResult, Value};
    pub use crate::rates::{load_rates, RateTable};
    pub use crate::transform::transform;
    pub use crate::types::{BankRecord, Dataset, NormalizedRecord};
}
