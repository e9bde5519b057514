//! neo-query: canned analytics and parameterized filters over near-Earth asteroid data
//!
//! This crate maps logical analytical questions to SQL over a two-table SQLite
//! dataset (`asteroids`, `close_approach`) and runs them:
//!
//! - [`QueryCatalog`]: fixed, labelled SELECT statements
//! - [`FilterQueryBuilder`]: structured range/date/hazard filters to one bound query
//! - [`QueryExecutor`]: the execution contract, implemented by [`AsteroidDb`]

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod storage;
pub mod types;

pub use analysis::{ChartHint, DatasetOverview, FilterSummary};
pub use catalog::{browse_query, CatalogEntry, QueryCatalog, QueryCategory, Table};
pub use config::{DatabaseConfig, NeoQueryConfig, OutputConfig, OutputFormat};
pub use error::{Error, Result};
pub use filter::{Bounds, DiameterMatch, FilterConfig, FilterQueryBuilder, HazardFilter};
pub use storage::{AsteroidDb, QueryExecutor};
pub use types::{ParameterizedQuery, ResultSet, Row};

/// Re-export of the SQLite value type used for parameters and cells
pub use rusqlite::types::Value;
