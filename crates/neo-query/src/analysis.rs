//! Derived figures over query results
//!
//! Dataset-wide metrics, quick statistics over a filter result and a chart
//! suggestion for a result's shape.

use rusqlite::types::Value;
use serde::Serialize;

use crate::error::Result;
use crate::storage::QueryExecutor;
use crate::types::{value_as_f64, ResultSet};

/// Headline counts for the whole dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    /// Distinct asteroids
    pub total_asteroids: i64,
    /// Recorded close approaches
    pub total_approaches: i64,
    /// Asteroids flagged potentially hazardous
    pub hazardous_count: i64,
    /// hazardous_count / total_asteroids * 100, zero for an empty dataset
    pub hazard_rate_percent: f64,
}

impl DatasetOverview {
    /// Run the three count queries
    pub fn load<E: QueryExecutor + ?Sized>(executor: &E) -> Result<Self> {
        let total_asteroids = count(executor, "SELECT COUNT(DISTINCT id) AS count FROM asteroids")?;
        let total_approaches = count(executor, "SELECT COUNT(*) AS count FROM close_approach")?;
        let hazardous_count = count(
            executor,
            "SELECT COUNT(*) AS count FROM asteroids WHERE is_potentially_hazardous_asteroid = 1",
        )?;

        let hazard_rate_percent = if total_asteroids > 0 {
            hazardous_count as f64 / total_asteroids as f64 * 100.0
        } else {
            0.0
        };

        Ok(Self {
            total_asteroids,
            total_approaches,
            hazardous_count,
            hazard_rate_percent,
        })
    }
}

fn count<E: QueryExecutor + ?Sized>(executor: &E, sql: &str) -> Result<i64> {
    let result = executor.execute(sql, &[])?;
    Ok(match result.scalar() {
        Some(Value::Integer(n)) => *n,
        _ => 0,
    })
}

/// Quick statistics over a filter result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSummary {
    /// Matching rows
    pub matches: usize,
    /// Mean `relative_velocity_kmph`
    pub avg_velocity_kmph: Option<f64>,
    /// Smallest `miss_distance_km`
    pub closest_miss_km: Option<f64>,
    /// Rows with the hazard flag set
    pub hazardous_in_results: Option<usize>,
}

impl FilterSummary {
    /// Summarize a result; absent columns leave their field `None`
    pub fn from_result(result: &ResultSet) -> Self {
        let avg_velocity_kmph = result
            .column_values("relative_velocity_kmph")
            .and_then(|values| {
                let numbers: Vec<f64> = values.filter_map(value_as_f64).collect();
                if numbers.is_empty() {
                    None
                } else {
                    Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
                }
            });

        let closest_miss_km = result
            .column_values("miss_distance_km")
            .and_then(|values| values.filter_map(value_as_f64).reduce(f64::min));

        let hazardous_in_results = result
            .column_values("is_potentially_hazardous_asteroid")
            .map(|values| values.filter(|v| value_as_f64(v) == Some(1.0)).count());

        Self {
            matches: result.len(),
            avg_velocity_kmph,
            closest_miss_km,
            hazardous_in_results,
        }
    }
}

/// Chart that suits a result's shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartHint {
    /// Bar chart of the first `rows` rows, `x` against `y`
    Bar { x: String, y: String, rows: usize },
    /// Histogram of one column over the first `rows` rows
    Histogram { column: String, rows: usize },
}

const COUNT_COLUMNS: [&str; 3] = ["count", "approach_count", "total"];

impl ChartHint {
    /// Two-column counts get a bar chart, a velocity second column a histogram
    pub fn for_result(result: &ResultSet) -> Option<Self> {
        if result.is_empty() {
            return None;
        }

        let columns = result.columns();
        if columns.len() == 2 && COUNT_COLUMNS.contains(&columns[1].as_str()) {
            return Some(ChartHint::Bar {
                x: columns[0].clone(),
                y: columns[1].clone(),
                rows: result.len().min(10),
            });
        }

        if columns.len() > 1 && columns[1].to_lowercase().contains("velocity") {
            return Some(ChartHint::Histogram {
                column: columns[1].clone(),
                rows: result.len().min(20),
            });
        }

        None
    }
}
