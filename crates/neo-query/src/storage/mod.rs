//! Storage module: query execution against the asteroid dataset
//!
//! Provides the executor contract and its SQLite implementation.

mod database;
mod executor;

pub use database::{AsteroidDb, REQUIRED_TABLES};
pub use executor::QueryExecutor;

#[cfg(test)]
pub(crate) use database::fixture;
