//! Named catalog of canned analytical queries
//!
//! Every entry is a read-only SELECT with no placeholders. Callers pick an
//! entry by its label; nothing they supply is ever spliced into the SQL.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::types::ParameterizedQuery;

/// Presentation grouping for catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Statistical,
    Hazard,
    SpeedMotion,
    DistanceSize,
    Temporal,
    Special,
}

impl QueryCategory {
    /// All categories in display order
    pub const ALL: [QueryCategory; 6] = [
        QueryCategory::Statistical,
        QueryCategory::Hazard,
        QueryCategory::SpeedMotion,
        QueryCategory::DistanceSize,
        QueryCategory::Temporal,
        QueryCategory::Special,
    ];

    /// Human-readable heading
    pub fn title(&self) -> &'static str {
        match self {
            QueryCategory::Statistical => "Statistical Analysis",
            QueryCategory::Hazard => "Hazard Assessment",
            QueryCategory::SpeedMotion => "Speed & Motion",
            QueryCategory::DistanceSize => "Distance & Size",
            QueryCategory::Temporal => "Temporal Analysis",
            QueryCategory::Special => "Special Queries",
        }
    }

    /// Stable identifier, matches the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::Statistical => "statistical",
            QueryCategory::Hazard => "hazard",
            QueryCategory::SpeedMotion => "speed_motion",
            QueryCategory::DistanceSize => "distance_size",
            QueryCategory::Temporal => "temporal",
            QueryCategory::Special => "special",
        }
    }

    /// Parse a stable identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One labelled query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique, stable label
    pub label: String,
    /// Presentation category
    pub category: QueryCategory,
    /// SQL text
    pub sql: String,
}

impl CatalogEntry {
    pub fn new(label: impl Into<String>, category: QueryCategory, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            category,
            sql: sql.into(),
        }
    }
}

const BUILTIN: &[(&str, QueryCategory, &str)] = &[
    (
        "1. Count asteroid approaches",
        QueryCategory::Statistical,
        r#"
        SELECT neo_reference_id, COUNT(*) AS approach_count
        FROM close_approach
        GROUP BY neo_reference_id
        ORDER BY approach_count DESC
        "#,
    ),
    (
        "2. Average velocity per asteroid",
        QueryCategory::Statistical,
        r#"
        SELECT neo_reference_id, AVG(relative_velocity_kmph) AS avg_velocity
        FROM close_approach
        GROUP BY neo_reference_id
        ORDER BY avg_velocity DESC
        "#,
    ),
    (
        "3. Top 10 fastest asteroids",
        QueryCategory::Statistical,
        r#"
        SELECT neo_reference_id, MAX(relative_velocity_kmph) AS max_velocity
        FROM close_approach
        GROUP BY neo_reference_id
        ORDER BY max_velocity DESC
        LIMIT 10
        "#,
    ),
    (
        "4. Hazardous asteroids > 3 approaches",
        QueryCategory::Hazard,
        r#"
        SELECT ca.neo_reference_id, COUNT(*) AS approach_count
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        WHERE a.is_potentially_hazardous_asteroid = 1
        GROUP BY ca.neo_reference_id
        HAVING COUNT(*) > 3
        "#,
    ),
    (
        "5. Month with most approaches",
        QueryCategory::Temporal,
        r#"
        SELECT strftime('%Y-%m', close_approach_date) AS month, COUNT(*) AS count
        FROM close_approach
        GROUP BY month
        ORDER BY count DESC
        LIMIT 1
        "#,
    ),
    (
        // Bare column next to MAX(): SQLite takes it from the row holding the max.
        "6. Fastest ever approach",
        QueryCategory::SpeedMotion,
        r#"
        SELECT neo_reference_id, MAX(relative_velocity_kmph) AS fastest_speed
        FROM close_approach
        ORDER BY fastest_speed DESC
        LIMIT 1
        "#,
    ),
    (
        "7. Sort by max estimated diameter",
        QueryCategory::DistanceSize,
        r#"
        SELECT id, name, estimated_diameter_max_km
        FROM asteroids
        ORDER BY estimated_diameter_max_km DESC
        "#,
    ),
    (
        "8. Closest approach getting nearer over time",
        QueryCategory::Temporal,
        r#"
        SELECT *
        FROM close_approach
        ORDER BY neo_reference_id, close_approach_date
        "#,
    ),
    (
        "9. Closest approach date & distance",
        QueryCategory::DistanceSize,
        r#"
        SELECT a.name, ca.close_approach_date, MIN(ca.miss_distance_km) AS closest_approach
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        GROUP BY a.id
        ORDER BY closest_approach ASC
        "#,
    ),
    (
        "10. Velocity > 50,000 km/h",
        QueryCategory::SpeedMotion,
        r#"
        SELECT DISTINCT a.name, ca.relative_velocity_kmph
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        WHERE ca.relative_velocity_kmph > 50000
        "#,
    ),
    (
        "11. Approaches per month",
        QueryCategory::Statistical,
        r#"
        SELECT strftime('%Y-%m', close_approach_date) AS month, COUNT(*) AS total
        FROM close_approach
        GROUP BY month
        ORDER BY total DESC
        "#,
    ),
    (
        "12. Brightest asteroid (lowest magnitude)",
        QueryCategory::Special,
        r#"
        SELECT id, name, absolute_magnitude_h
        FROM asteroids
        ORDER BY absolute_magnitude_h ASC
        LIMIT 1
        "#,
    ),
    (
        "13. Hazardous vs Non-hazardous count",
        QueryCategory::Hazard,
        r#"
        SELECT is_potentially_hazardous_asteroid, COUNT(*) AS count
        FROM asteroids
        GROUP BY is_potentially_hazardous_asteroid
        "#,
    ),
    (
        "14. Asteroids < 1 LD",
        QueryCategory::DistanceSize,
        r#"
        SELECT a.name, ca.close_approach_date, ca.miss_distance_lunar
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        WHERE ca.miss_distance_lunar < 1
        ORDER BY ca.miss_distance_lunar
        "#,
    ),
    (
        "15. Asteroids < 0.05 AU",
        QueryCategory::DistanceSize,
        r#"
        SELECT a.name, ca.close_approach_date, ca.astronomical
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        WHERE ca.astronomical < 0.05
        ORDER BY ca.astronomical
        "#,
    ),
    (
        "Bonus 1: Orbiting bodies (non-Earth)",
        QueryCategory::Special,
        r#"
        SELECT orbiting_body, COUNT(*) AS count
        FROM close_approach
        WHERE orbiting_body != 'Earth'
        GROUP BY orbiting_body
        ORDER BY count DESC
        "#,
    ),
    (
        "Bonus 2: Avg miss distance by hazard type",
        QueryCategory::Hazard,
        r#"
        SELECT a.is_potentially_hazardous_asteroid, AVG(ca.miss_distance_km) AS avg_miss_distance
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        GROUP BY a.is_potentially_hazardous_asteroid
        "#,
    ),
    (
        "Bonus 3: Top 5 closest approaches",
        QueryCategory::DistanceSize,
        r#"
        SELECT a.name, ca.close_approach_date, ca.miss_distance_km
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        ORDER BY ca.miss_distance_km ASC
        LIMIT 5
        "#,
    ),
    (
        "Bonus 4: Count of hazardous asteroids",
        QueryCategory::Hazard,
        r#"
        SELECT COUNT(DISTINCT id) AS hazardous_asteroid_count
        FROM asteroids
        WHERE is_potentially_hazardous_asteroid = 1
        "#,
    ),
    (
        "Bonus 5: Frequent <1 LD asteroids",
        QueryCategory::Special,
        r#"
        SELECT ca.neo_reference_id, a.name, COUNT(*) AS close_pass_count
        FROM close_approach ca
        JOIN asteroids a ON ca.neo_reference_id = a.id
        WHERE ca.miss_distance_lunar < 1
        GROUP BY ca.neo_reference_id
        HAVING COUNT(*) > 1
        ORDER BY close_pass_count DESC
        "#,
    ),
];

/// Immutable, ordered mapping from label to SQL
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCatalog {
    /// The built-in catalog
    pub fn new() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(label, category, sql)| CatalogEntry::new(*label, *category, sql.trim()))
            .collect();

        Self { entries }
    }

    /// Append extra entries after the built-in ones
    ///
    /// Rejects duplicate labels and anything that is not a single read-only
    /// SELECT (or WITH ... SELECT) statement.
    pub fn with_entries<I>(mut self, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        for mut entry in extra {
            entry.label = entry.label.trim().to_string();
            entry.sql = entry.sql.trim().to_string();

            if entry.label.is_empty() {
                return Err(Error::config("catalog entry with empty label"));
            }
            if self.contains(&entry.label) {
                return Err(Error::config(format!(
                    "duplicate catalog label: {}",
                    entry.label
                )));
            }
            if !is_read_only_select(&entry.sql) {
                return Err(Error::config(format!(
                    "catalog entry '{}' must be a single SELECT statement",
                    entry.label
                )));
            }

            tracing::debug!("Registered catalog entry: {}", entry.label);
            self.entries.push(entry);
        }

        Ok(self)
    }

    /// SQL text for a label
    pub fn get(&self, label: &str) -> Result<&str> {
        self.entry(label)
            .map(|e| e.sql.as_str())
            .ok_or_else(|| Error::unknown_query(label))
    }

    /// Full entry for a label
    pub fn entry(&self, label: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Whether a label exists
    pub fn contains(&self, label: &str) -> bool {
        self.entry(label).is_some()
    }

    /// All labels in catalog order
    pub fn list_labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// All entries in catalog order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by category, categories in display order, empty ones skipped
    pub fn grouped(&self) -> Vec<(QueryCategory, Vec<&CatalogEntry>)> {
        QueryCategory::ALL
            .into_iter()
            .map(|category| {
                let members = self
                    .entries
                    .iter()
                    .filter(|e| e.category == category)
                    .collect::<Vec<_>>();
                (category, members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect()
    }
}

/// First keyword is SELECT/WITH and there is no second statement
fn is_read_only_select(sql: &str) -> bool {
    let body = sql.trim().trim_end_matches(';').trim_end();
    if body.contains(';') {
        return false;
    }

    let first = body
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();

    first == "SELECT" || first == "WITH"
}

/// Raw tables that can be browsed directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Asteroids,
    CloseApproaches,
}

impl Table {
    /// SQL table name
    pub fn table_name(&self) -> &'static str {
        match self {
            Table::Asteroids => "asteroids",
            Table::CloseApproaches => "close_approach",
        }
    }
}

/// `SELECT *` over a whole table, optionally capped by a bound LIMIT
pub fn browse_query(table: Table, limit: Option<u64>) -> ParameterizedQuery {
    let mut sql = format!("SELECT * FROM {}", table.table_name());
    match limit {
        Some(n) => {
            sql.push_str(" LIMIT ?1");
            let n = i64::try_from(n).unwrap_or(i64::MAX);
            ParameterizedQuery::with_params(sql, vec![Value::Integer(n)])
        }
        None => ParameterizedQuery::new(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_twenty_unique_labels() {
        let catalog = QueryCatalog::new();
        let labels = catalog.list_labels();
        assert_eq!(labels.len(), 20);

        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 20);

        assert_eq!(labels[0], "1. Count asteroid approaches");
        assert_eq!(labels[14], "15. Asteroids < 0.05 AU");
        assert_eq!(labels[19], "Bonus 5: Frequent <1 LD asteroids");
    }

    #[test]
    fn test_every_label_resolves_to_select() {
        let catalog = QueryCatalog::new();
        for label in catalog.list_labels() {
            let sql = catalog.get(label).unwrap();
            assert!(!sql.is_empty(), "{label} has empty SQL");
            assert!(is_read_only_select(sql), "{label} is not a SELECT");
            assert!(!sql.contains('?'), "{label} has a placeholder");
        }
    }

    #[test]
    fn test_unknown_label() {
        let catalog = QueryCatalog::new();
        match catalog.get("nonexistent") {
            Err(Error::UnknownQuery(label)) => assert_eq!(label, "nonexistent"),
            other => panic!("expected UnknownQuery, got {:?}", other),
        }
    }

    #[test]
    fn test_grouping_covers_every_entry_once() {
        let catalog = QueryCatalog::new();
        let groups = catalog.grouped();

        let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
        assert_eq!(total, catalog.len());
        assert_eq!(groups.len(), QueryCategory::ALL.len());

        let (first, members) = &groups[0];
        assert_eq!(*first, QueryCategory::Statistical);
        assert_eq!(members[0].label, "1. Count asteroid approaches");
    }

    #[test]
    fn test_category_ids_round_trip() {
        for category in QueryCategory::ALL {
            assert_eq!(QueryCategory::from_id(category.as_str()), Some(category));
        }
        assert_eq!(QueryCategory::from_id("bogus"), None);
    }

    #[test]
    fn test_custom_entries_are_appended() {
        let catalog = QueryCatalog::new()
            .with_entries(vec![CatalogEntry::new(
                "Custom: Slowest approach",
                QueryCategory::SpeedMotion,
                "SELECT MIN(relative_velocity_kmph) AS slowest FROM close_approach",
            )])
            .unwrap();

        assert_eq!(catalog.len(), 21);
        assert_eq!(catalog.list_labels()[20], "Custom: Slowest approach");
        assert!(catalog.get("Custom: Slowest approach").is_ok());
    }

    #[test]
    fn test_custom_entries_rejected() {
        let dup = QueryCatalog::new().with_entries(vec![CatalogEntry::new(
            "3. Top 10 fastest asteroids",
            QueryCategory::Special,
            "SELECT 1",
        )]);
        assert!(matches!(dup, Err(Error::Config(_))));

        let write = QueryCatalog::new().with_entries(vec![CatalogEntry::new(
            "Drop",
            QueryCategory::Special,
            "DELETE FROM asteroids",
        )]);
        assert!(matches!(write, Err(Error::Config(_))));

        let stacked = QueryCatalog::new().with_entries(vec![CatalogEntry::new(
            "Stacked",
            QueryCategory::Special,
            "SELECT 1; DROP TABLE asteroids",
        )]);
        assert!(matches!(stacked, Err(Error::Config(_))));
    }

    #[test]
    fn test_browse_query_binds_limit() {
        let q = browse_query(Table::CloseApproaches, Some(25));
        assert_eq!(q.sql, "SELECT * FROM close_approach LIMIT ?1");
        assert_eq!(q.params, vec![Value::Integer(25)]);

        let all = browse_query(Table::Asteroids, None);
        assert_eq!(all.sql, "SELECT * FROM asteroids");
        assert!(all.params.is_empty());
    }
}
