//! Persistence of the normalized dataset
//!
//! - **file**: CSV output, replaced atomically
//! - **table**: SQLite table, dropped and recreated on every save
//!
//! Both outputs carry the same columns in the same order, and amounts are
//! stored as `f64` in both, so the file and the table always agree.

pub mod file;
pub mod table;

pub use file::save_to_file;
pub use table::{quote_identifier, save_to_table, Store};
