//! Query executor trait

use rusqlite::types::Value;

use crate::catalog::QueryCatalog;
use crate::error::Result;
use crate::filter::{FilterConfig, FilterQueryBuilder};
use crate::types::{ParameterizedQuery, ResultSet};

/// Runs finished SQL against the dataset
///
/// Implementations:
/// - `AsteroidDb`: SQLite file (or in-memory database)
///
/// Failures surface as `Error::QueryExecution` carrying the engine message.
/// Nothing is retried.
pub trait QueryExecutor {
    /// Execute one statement with numbered parameters
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultSet>;

    /// Execute a prepared query
    fn run(&self, query: &ParameterizedQuery) -> Result<ResultSet> {
        self.execute(&query.sql, &query.params)
    }

    /// Look up and execute a catalog entry
    fn run_catalog(&self, catalog: &QueryCatalog, label: &str) -> Result<ResultSet> {
        let sql = catalog.get(label)?;
        tracing::debug!("Running catalog query: {}", label);
        self.execute(sql, &[])
    }

    /// Build and execute a filter query
    fn run_filter(&self, filter: &FilterConfig) -> Result<ResultSet> {
        self.run(&FilterQueryBuilder::build(filter))
    }
}
