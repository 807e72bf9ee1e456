//! Read-only queries against the persisted table
//!
//! Statements are trusted input, supplied by configuration or by the operator
//! on the command line. They must be classified read-only by SQLite and must
//! not change connection state: transaction control and `ATTACH`/`DETACH` are
//! refused, and a statement that still leaves a transaction open is rolled back.

use crate::error::{EtlError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement};
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// A scalar value returned by a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Numeric value, for integers and reals
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Column names and rows returned by a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The single value of a one-row, one-column result
    pub fn scalar(&self) -> Option<&Value> {
        match (self.rows.as_slice(), self.columns.len()) {
            ([row], 1) => row.first(),
            _ => None,
        }
    }

    /// All values of a named column
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    /// Write the result as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;

        for (row, values) in cells.iter().zip(&self.rows) {
            let line: Vec<String> = row
                .iter()
                .zip(values)
                .zip(&widths)
                .map(|((cell, value), w)| match value {
                    Value::Integer(_) | Value::Real(_) => format!("{:>w$}", cell, w = *w),
                    _ => format!("{:<w$}", cell, w = *w),
                })
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }

        write!(f, "({} row{})", self.rows.len(), if self.rows.len() == 1 { "" } else { "s" })
    }
}

/// Statements SQLite reports as read-only that still change the session
const SESSION_KEYWORDS: &[&str] = &[
    "BEGIN", "COMMIT", "END", "ROLLBACK", "SAVEPOINT", "RELEASE", "ATTACH", "DETACH",
];

fn leading_keyword(statement: &str) -> String {
    statement
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn collect_rows(stmt: &mut Statement, width: usize) -> rusqlite::Result<Vec<Vec<Value>>> {
    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let values = (0..width)
            .map(|i| row.get_ref(i).map(Value::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.push(values);
    }
    Ok(rows)
}

/// Execute a read-only statement and collect every row
///
/// Statements that would modify the database or the connection are rejected
/// before they run. The connection's transaction state is the same afterwards.
pub fn run_query(statement: &str, conn: &Connection) -> Result<QueryResult> {
    let fail = |e: rusqlite::Error| EtlError::Query(format!("{}: {}", statement, e));

    let mut stmt = conn.prepare(statement).map_err(fail)?;
    let keyword = leading_keyword(statement);
    if !stmt.readonly() || SESSION_KEYWORDS.contains(&keyword.as_str()) {
        return Err(EtlError::Query(format!(
            "statement is not read-only: {}",
            statement
        )));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let autocommit = conn.is_autocommit();
    let rows = collect_rows(&mut stmt, columns.len()).map_err(fail);
    drop(stmt);

    if autocommit && !conn.is_autocommit() {
        conn.execute_batch("ROLLBACK").map_err(fail)?;
        return Err(EtlError::Query(format!(
            "statement opened a transaction: {}",
            statement
        )));
    }

    let rows = rows?;
    log::debug!("Query returned {} rows: {}", rows.len(), statement);
    Ok(QueryResult { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE banks (Name TEXT, MC_USD_Billion REAL);
             INSERT INTO banks VALUES ('JPMorgan Chase', 432.92);
             INSERT INTO banks VALUES ('Bank of America', 231.52);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_select_all() {
        let conn = connection();
        let result = run_query("SELECT * FROM banks", &conn).unwrap();

        assert_eq!(result.columns, vec!["Name", "MC_USD_Billion"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0][0], Value::Text("JPMorgan Chase".to_string()));
        assert_eq!(result.rows[1][1], Value::Real(231.52));
    }

    #[test]
    fn test_scalar_aggregate() {
        let conn = connection();
        let result = run_query("SELECT COUNT(*) FROM banks", &conn).unwrap();
        assert_eq!(result.scalar(), Some(&Value::Integer(2)));
        assert_eq!(result.scalar().and_then(Value::as_f64), Some(2.0));
    }

    #[test]
    fn test_write_statement_rejected() {
        let conn = connection();
        let err = run_query("DELETE FROM banks", &conn).unwrap_err();
        assert!(matches!(err, EtlError::Query(_)));

        let count = run_query("SELECT COUNT(*) FROM banks", &conn).unwrap();
        assert_eq!(count.scalar(), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_transaction_control_rejected() {
        let mut conn = connection();
        for statement in ["BEGIN", "begin immediate", "SAVEPOINT sp", "COMMIT", "ATTACH ':memory:' AS other"] {
            let err = run_query(statement, &conn).unwrap_err();
            assert!(matches!(err, EtlError::Query(_)), "{}", statement);
            assert!(conn.is_autocommit(), "{}", statement);
        }

        // Connection still accepts its own transactions
        let tx = conn.transaction().unwrap();
        tx.execute_batch("DELETE FROM banks").unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn test_hidden_begin_rolled_back() {
        let conn = connection();
        let err = run_query("/* report */ BEGIN", &conn).unwrap_err();
        assert!(matches!(err, EtlError::Query(_)));
        assert!(conn.is_autocommit());
    }

    #[test]
    fn test_invalid_statement() {
        let conn = connection();
        assert!(matches!(
            run_query("SELECT * FROM missing_table", &conn),
            Err(EtlError::Query(_))
        ));
    }

    #[test]
    fn test_column_lookup() {
        let conn = connection();
        let result = run_query("SELECT Name FROM banks LIMIT 5", &conn).unwrap();
        let names: Vec<&str> = result
            .column("Name")
            .unwrap()
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(names, vec!["JPMorgan Chase", "Bank of America"]);
        assert!(result.column("Rank").is_none());
    }

    #[test]
    fn test_display_table() {
        let result = QueryResult {
            columns: vec!["Name".to_string(), "MC".to_string()],
            rows: vec![
                vec![Value::Text("HSBC".to_string()), Value::Real(160.68)],
                vec![Value::Text("UBS".to_string()), Value::Null],
            ],
        };

        assert_eq!(
            result.to_string(),
            "Name  MC\nHSBC  160.68\nUBS   NULL\n(2 rows)"
        );
    }

    #[test]
    fn test_json_and_csv_output() {
        let result = QueryResult {
            columns: vec!["Name".to_string(), "MC".to_string()],
            rows: vec![vec![Value::Text("HSBC".to_string()), Value::Real(160.68)]],
        };

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"columns":["Name","MC"],"rows":[["HSBC",160.68]]}"#);

        let mut bytes = Vec::new();
        result.write_csv(&mut bytes).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Name,MC\nHSBC,160.68\n");
    }
}
