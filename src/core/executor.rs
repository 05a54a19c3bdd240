//! Query execution boundary.
//!
//! The persister hands over parameterized SQL text plus a positional argument
//! list; writes come back as affected-row counts and reads as column-keyed
//! records. [`SqliteExecutor`] is the in-tree implementation.

use crate::core::error::StorageError;
use crate::core::sql;
use rusqlite::Connection;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// One result row, keyed by column name. An empty result set signals zero
/// matches, not an error.
pub type Row = HashMap<String, JsonValue>;

pub trait QueryExecutor {
    /// Runs a write statement, returning the affected-row count.
    fn execute(&self, query: &str, args: &[JsonValue]) -> Result<usize, StorageError>;
    /// Runs a read statement, returning all matching rows.
    fn query(&self, query: &str, args: &[JsonValue]) -> Result<Vec<Row>, StorageError>;
}

/// Executor over a hardened rusqlite connection: 5s busy timeout, WAL
/// journaling, foreign keys on.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
        conn.execute("PRAGMA foreign_keys=ON;", [])?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys=ON;", [])?;
        Ok(Self { conn })
    }

    /// Runs multi-statement DDL (schema setup, triggers). Not part of the
    /// executor contract; the persister never calls this.
    pub fn execute_batch(&self, ddl: &str) -> Result<(), StorageError> {
        self.conn.execute_batch(ddl)?;
        Ok(())
    }

    fn bind(&self, query: &str, args: &[JsonValue]) -> Result<(String, Vec<rusqlite::types::Value>), StorageError> {
        let bound = sql::bind_placeholders(query, args.len())?;
        let params = args
            .iter()
            .map(sql::to_sql_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((bound, params))
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, query: &str, args: &[JsonValue]) -> Result<usize, StorageError> {
        let (bound, params) = self.bind(query, args)?;
        let affected = self.conn.execute(&bound, rusqlite::params_from_iter(params))?;
        Ok(affected)
    }

    fn query(&self, query: &str, args: &[JsonValue]) -> Result<Vec<Row>, StorageError> {
        let (bound, params) = self.bind(query, args)?;
        let mut stmt = self.conn.prepare(&bound)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), sql::from_sql_value(row.get_ref(i)?)?);
            }
            out.push(record);
        }
        Ok(out)
    }
}
