//! Core types shared by the catalog, filter builder and executor

pub mod query;
pub mod result;

pub use query::ParameterizedQuery;
pub use result::{value_as_f64, value_to_display, ResultSet, Row};
