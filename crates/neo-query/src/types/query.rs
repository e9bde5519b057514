//! SQL text paired with its bound parameters

use rusqlite::types::Value;

/// A finished SQL statement and the values bound to its placeholders
///
/// Placeholders are numbered (`?1`, `?2`, ...) and `params[i]` binds `?{i + 1}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedQuery {
    /// SQL text
    pub sql: String,
    /// Values for the numbered placeholders, in order
    pub params: Vec<Value>,
}

impl ParameterizedQuery {
    /// Create a query with no parameters
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Create a query with bound parameters
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Number of bound parameters
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}
