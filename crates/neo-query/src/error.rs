//! Error types for the NEO query layer

use thiserror::Error;

/// Result type alias for query operations
pub type Result<T> = std::result::Result<T, Error>;

/// Query layer errors
#[derive(Debug, Error)]
pub enum Error {
    /// Requested catalog label does not exist
    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    /// The database engine rejected the statement
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// Database could not be opened or is missing a table
    #[error("Database error: {0}")]
    Database(String),

    /// Filter bounds rejected by strict validation
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an unknown query error
    pub fn unknown_query(label: impl Into<String>) -> Self {
        Self::UnknownQuery(label.into())
    }

    /// Create a query execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::QueryExecution(message.into())
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create an invalid filter error
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
