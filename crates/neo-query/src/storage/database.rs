//! SQLite-backed query executor
//!
//! Opens the asteroid dataset (read-only by default) and runs catalog and
//! filter queries against it.

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::executor::QueryExecutor;
use crate::catalog::{browse_query, Table};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::types::ResultSet;

/// Tables every query assumes
pub const REQUIRED_TABLES: [&str; 2] = ["asteroids", "close_approach"];

/// SQLite connection to the asteroid dataset
pub struct AsteroidDb {
    conn: Arc<Mutex<Connection>>,
}

impl AsteroidDb {
    /// Open an existing database file read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = DatabaseConfig {
            path: path.as_ref().to_path_buf(),
            ..DatabaseConfig::default()
        };
        Self::open_with(&config)
    }

    /// Open using connection settings
    pub fn open_with(config: &DatabaseConfig) -> Result<Self> {
        let path = &config.path;
        if !path.exists() {
            return Err(Error::database(format!(
                "database file not found: {}",
                path.display()
            )));
        }

        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| Error::database(format!("Failed to set busy timeout: {}", e)))?;

        tracing::info!(
            "Opened database {} (read_only={})",
            path.display(),
            config.read_only
        );

        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection owned by the caller
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Verify both dataset tables exist
    pub fn check_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        for table in REQUIRED_TABLES {
            let found: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| Error::database(format!("Failed to inspect schema: {}", e)))?;

            if found.is_none() {
                return Err(Error::database(format!("missing table: {}", table)));
            }
        }

        Ok(())
    }

    /// Every row of a raw table, optionally capped
    pub fn browse(&self, table: Table, limit: Option<u64>) -> Result<ResultSet> {
        self.run(&browse_query(table, limit))
    }
}

impl QueryExecutor for AsteroidDb {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        tracing::debug!(params = params.len(), "Executing SQL: {}", sql.trim());

        let conn = self.conn.lock();
        let result = collect_rows(&conn, sql, params);

        match &result {
            Ok(set) => tracing::debug!("Query returned {} rows", set.len()),
            Err(e) => tracing::warn!("{}", e),
        }

        result
    }
}

fn collect_rows(conn: &Connection, sql: &str, params: &[Value]) -> Result<ResultSet> {
    let mut stmt = conn.prepare(sql).map_err(|e| Error::execution(e.to_string()))?;

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let mut rows = stmt
        .query(params_from_iter(params.iter()))
        .map_err(|e| Error::execution(e.to_string()))?;

    let mut values = Vec::new();
    while let Some(row) = rows.next().map_err(|e| Error::execution(e.to_string()))? {
        let mut record = Vec::with_capacity(width);
        for idx in 0..width {
            let value: Value = row.get(idx).map_err(|e| Error::execution(e.to_string()))?;
            record.push(value);
        }
        values.push(record);
    }

    Ok(ResultSet::new(columns, values))
}
