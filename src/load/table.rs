//! Dataset persistence with SQLite

use crate::error::{EtlError, Result};
use crate::query::{run_query, QueryResult};
use crate::types::Dataset;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

/// Quote an SQL identifier, doubling any embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Write the dataset into `table_name`, replacing any existing table
///
/// Drop, create and inserts run in a single transaction. If any step fails the
/// transaction rolls back and the previous table, if there was one, is kept.
/// Saving the same dataset twice leaves exactly one copy of each row.
pub fn save_to_table(dataset: &Dataset, conn: &mut Connection, table_name: &str) -> Result<()> {
    let target = format!("table {}", table_name);
    let fail = |e: rusqlite::Error| EtlError::persistence(&target, e);

    let columns = dataset.columns();
    let table = quote_identifier(table_name);
    let definitions: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let sql_type = if i == 0 { "TEXT" } else { "REAL" };
            format!("{} {}", quote_identifier(c), sql_type)
        })
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    let tx = conn.transaction().map_err(fail)?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} ({});",
        definitions.join(", ")
    ))
    .map_err(fail)?;

    {
        let mut stmt = tx
            .prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))
            .map_err(fail)?;

        for record in dataset.records() {
            let amounts = record.amounts().map(rusqlite::types::Value::Real);
            let values = std::iter::once(rusqlite::types::Value::Text(record.name.clone())).chain(amounts);
            stmt.execute(params_from_iter(values)).map_err(fail)?;
        }
    }

    tx.commit().map_err(fail)?;
    log::debug!("Replaced table {} with {} rows", table_name, dataset.len());
    Ok(())
}

/// Owner of the single database connection used for a run
///
/// The connection is released by [`Store::close`] or, failing that, when the
/// store is dropped.
pub struct Store {
    conn: Connection,
    location: String,
}

impl Store {
    /// Create or open database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let location = db_path.display().to_string();
        let conn = Connection::open(db_path)
            .map_err(|e| EtlError::persistence(&location, format!("failed to open database: {}", e)))?;

        log::debug!("Opened database {}", location);
        Ok(Self { conn, location })
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            EtlError::persistence(":memory:", format!("failed to create in-memory database: {}", e))
        })?;

        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    /// Database location, a file path or `:memory:`
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Replace `table_name` with the dataset
    pub fn save(&mut self, dataset: &Dataset, table_name: &str) -> Result<()> {
        save_to_table(dataset, &mut self.conn, table_name)
    }

    /// Run a read-only statement
    pub fn query(&self, statement: &str) -> Result<QueryResult> {
        run_query(statement, &self.conn)
    }

    /// Number of rows in a table
    pub fn row_count(&self, table_name: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| EtlError::Query(format!("failed to count rows of {}: {}", table_name, e)))?;
        Ok(count as usize)
    }

    /// Close the connection, reporting any error SQLite raises on close
    pub fn close(self) -> Result<()> {
        let location = self.location;
        self.conn
            .close()
            .map_err(|(_, e)| EtlError::persistence(&location, format!("failed to close database: {}", e)))?;
        log::debug!("Closed database {}", location);
        Ok(())
    }
}
