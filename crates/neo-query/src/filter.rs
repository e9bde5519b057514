//! Structured filters over the asteroid/close-approach join
//!
//! [`FilterQueryBuilder::build`] turns a [`FilterConfig`] into one SELECT whose
//! WHERE clause is the conjunction of the active predicates. Every caller value
//! is bound through a numbered placeholder; only fixed column names and the
//! hazard flag literal appear in the SQL text.

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::ParameterizedQuery;

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &str, non_negative: bool) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::invalid_filter(format!(
                "{name}: bounds must be finite numbers"
            )));
        }
        if self.min > self.max {
            return Err(Error::invalid_filter(format!(
                "{name}: min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if non_negative && self.min < 0.0 {
            return Err(Error::invalid_filter(format!(
                "{name}: min {} is negative",
                self.min
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min, self.max)
    }
}

/// Parses `MIN:MAX`, e.g. `0:0.05`
impl FromStr for Bounds {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (min, max) = s
            .split_once(':')
            .ok_or_else(|| Error::invalid_filter(format!("expected MIN:MAX, got '{s}'")))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| Error::invalid_filter(format!("'{}' in '{s}': {e}", part.trim())))
        };

        Ok(Self::new(parse(min)?, parse(max)?))
    }
}

/// Tri-state hazard selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardFilter {
    /// No hazard predicate
    #[default]
    #[serde(alias = "Both")]
    Both,
    /// Only potentially hazardous asteroids
    #[serde(alias = "Yes")]
    Yes,
    /// Only non-hazardous asteroids
    #[serde(alias = "No")]
    No,
}

impl HazardFilter {
    /// Flag value the predicate compares against, `None` for Both
    pub fn flag(&self) -> Option<u8> {
        match self {
            HazardFilter::Both => None,
            HazardFilter::Yes => Some(1),
            HazardFilter::No => Some(0),
        }
    }
}

impl FromStr for HazardFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(HazardFilter::Both),
            "yes" => Ok(HazardFilter::Yes),
            "no" => Ok(HazardFilter::No),
            other => Err(Error::invalid_filter(format!(
                "hazard filter must be Both, Yes or No, got '{other}'"
            ))),
        }
    }
}

/// Which diameter columns a diameter range is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterMatch {
    /// `estimated_diameter_max_km` lies within the range
    #[default]
    MaxWithin,
    /// `estimated_diameter_min_km >= min` and `estimated_diameter_max_km <= max`
    Envelope,
}

/// User-chosen filter bounds; `None` leaves a dimension unconstrained
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Approaches on or after this date
    pub after_date: Option<NaiveDate>,
    /// Approaches on or before this date
    pub before_date: Option<NaiveDate>,
    /// Relative velocity in km/h
    pub velocity_range: Option<Bounds>,
    /// Estimated diameter in km
    pub diameter_range: Option<Bounds>,
    pub diameter_match: DiameterMatch,
    /// Absolute magnitude (H)
    pub magnitude_range: Option<Bounds>,
    /// Miss distance in astronomical units (`astronomical` column)
    pub au_range: Option<Bounds>,
    /// Miss distance in lunar distances (`miss_distance_lunar` column)
    pub ld_range: Option<Bounds>,
    /// Miss distance in kilometres (`miss_distance_km` column)
    pub km_range: Option<Bounds>,
    pub hazard: HazardFilter,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial widget values of the dashboard filter panel
    pub fn dashboard_defaults() -> Self {
        Self {
            after_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            velocity_range: Some(Bounds::new(0.0, 50_000.0)),
            diameter_range: Some(Bounds::new(0.0, 5.0)),
            au_range: Some(Bounds::new(0.0, 0.05)),
            ld_range: Some(Bounds::new(0.0, 10.0)),
            ..Self::default()
        }
    }

    pub fn with_after_date(mut self, date: NaiveDate) -> Self {
        self.after_date = Some(date);
        self
    }

    pub fn with_before_date(mut self, date: NaiveDate) -> Self {
        self.before_date = Some(date);
        self
    }

    pub fn with_velocity(mut self, min: f64, max: f64) -> Self {
        self.velocity_range = Some(Bounds::new(min, max));
        self
    }

    pub fn with_diameter(mut self, min: f64, max: f64, matching: DiameterMatch) -> Self {
        self.diameter_range = Some(Bounds::new(min, max));
        self.diameter_match = matching;
        self
    }

    pub fn with_magnitude(mut self, min: f64, max: f64) -> Self {
        self.magnitude_range = Some(Bounds::new(min, max));
        self
    }

    pub fn with_au(mut self, min: f64, max: f64) -> Self {
        self.au_range = Some(Bounds::new(min, max));
        self
    }

    pub fn with_ld(mut self, min: f64, max: f64) -> Self {
        self.ld_range = Some(Bounds::new(min, max));
        self
    }

    pub fn with_km(mut self, min: f64, max: f64) -> Self {
        self.km_range = Some(Bounds::new(min, max));
        self
    }

    pub fn with_hazard(mut self, hazard: HazardFilter) -> Self {
        self.hazard = hazard;
        self
    }

    /// Strict checks, opt-in
    ///
    /// [`FilterQueryBuilder::build`] never calls this: an inverted range
    /// builds fine and just matches nothing.
    pub fn validate(&self) -> Result<()> {
        if let (Some(after), Some(before)) = (self.after_date, self.before_date) {
            if after > before {
                return Err(Error::invalid_filter(format!(
                    "after_date {after} is later than before_date {before}"
                )));
            }
        }

        let checks = [
            ("velocity_range", self.velocity_range, true),
            ("diameter_range", self.diameter_range, true),
            ("magnitude_range", self.magnitude_range, false),
            ("au_range", self.au_range, true),
            ("ld_range", self.ld_range, true),
            ("km_range", self.km_range, true),
        ];

        for (name, bounds, non_negative) in checks {
            if let Some(bounds) = bounds {
                bounds.check(name, non_negative)?;
            }
        }

        Ok(())
    }

    /// Shorthand for [`FilterQueryBuilder::build`]
    pub fn to_query(&self) -> ParameterizedQuery {
        FilterQueryBuilder::build(self)
    }
}

/// Columns returned by every filter query, in order
pub const FILTER_COLUMNS: &[&str] = &[
    "name",
    "close_approach_date",
    "relative_velocity_kmph",
    "miss_distance_km",
    "miss_distance_lunar",
    "astronomical",
    "absolute_magnitude_h",
    "estimated_diameter_min_km",
    "estimated_diameter_max_km",
    "is_potentially_hazardous_asteroid",
];

const SELECT_JOIN: &str = "SELECT a.name, ca.close_approach_date, ca.relative_velocity_kmph, \
ca.miss_distance_km, ca.miss_distance_lunar, ca.astronomical, a.absolute_magnitude_h, \
a.estimated_diameter_min_km, a.estimated_diameter_max_km, a.is_potentially_hazardous_asteroid
FROM close_approach ca
JOIN asteroids a ON ca.neo_reference_id = a.id";

/// Pure translation from [`FilterConfig`] to SQL
pub struct FilterQueryBuilder;

impl FilterQueryBuilder {
    /// Build the filter query
    ///
    /// Deterministic and infallible. Predicates appear in a fixed order:
    /// dates, velocity, diameter, magnitude, AU, LD, km, hazard.
    pub fn build(config: &FilterConfig) -> ParameterizedQuery {
        let mut clauses = ClauseList::default();

        if let Some(date) = config.after_date {
            let p = clauses.bind(date_value(date));
            clauses.push(format!("date(ca.close_approach_date) >= date({p})"));
        }
        if let Some(date) = config.before_date {
            let p = clauses.bind(date_value(date));
            clauses.push(format!("date(ca.close_approach_date) <= date({p})"));
        }
        if let Some(bounds) = config.velocity_range {
            clauses.between("ca.relative_velocity_kmph", bounds);
        }
        if let Some(bounds) = config.diameter_range {
            match config.diameter_match {
                DiameterMatch::MaxWithin => {
                    clauses.between("a.estimated_diameter_max_km", bounds);
                }
                DiameterMatch::Envelope => {
                    let lo = clauses.bind(Value::Real(bounds.min));
                    clauses.push(format!("a.estimated_diameter_min_km >= {lo}"));
                    let hi = clauses.bind(Value::Real(bounds.max));
                    clauses.push(format!("a.estimated_diameter_max_km <= {hi}"));
                }
            }
        }
        if let Some(bounds) = config.magnitude_range {
            clauses.between("a.absolute_magnitude_h", bounds);
        }
        if let Some(bounds) = config.au_range {
            clauses.between("ca.astronomical", bounds);
        }
        if let Some(bounds) = config.ld_range {
            clauses.between("ca.miss_distance_lunar", bounds);
        }
        if let Some(bounds) = config.km_range {
            clauses.between("ca.miss_distance_km", bounds);
        }
        if let Some(flag) = config.hazard.flag() {
            clauses.push(format!("a.is_potentially_hazardous_asteroid = {flag}"));
        }

        let mut sql = String::from(SELECT_JOIN);
        if !clauses.predicates.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&clauses.predicates.join("\n  AND "));
        }

        tracing::trace!(
            predicates = clauses.predicates.len(),
            params = clauses.params.len(),
            "Built filter query"
        );

        ParameterizedQuery::with_params(sql, clauses.params)
    }
}

#[derive(Default)]
struct ClauseList {
    predicates: Vec<String>,
    params: Vec<Value>,
}

impl ClauseList {
    /// Bind a value, returning its placeholder
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn push(&mut self, predicate: String) {
        self.predicates.push(predicate);
    }

    fn between(&mut self, column: &str, bounds: Bounds) {
        let lo = self.bind(Value::Real(bounds.min));
        let hi = self.bind(Value::Real(bounds.max));
        self.push(format!("{column} BETWEEN {lo} AND {hi}"));
    }
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hazard_predicates(sql: &str) -> usize {
        sql.matches("is_potentially_hazardous_asteroid =").count()
    }

    #[test]
    fn test_empty_config_has_no_where() {
        let q = FilterQueryBuilder::build(&FilterConfig::new());
        assert!(!q.sql.contains("WHERE"));
        assert!(q.params.is_empty());
        assert!(q.sql.contains("JOIN asteroids a ON ca.neo_reference_id = a.id"));
        assert!(!q.sql.contains("ORDER BY"));
    }

    #[test]
    fn test_hazard_both_omits_predicate() {
        let q = FilterConfig::dashboard_defaults().to_query();
        assert_eq!(hazard_predicates(&q.sql), 0);
    }

    #[test]
    fn test_hazard_yes_and_no_add_one_literal() {
        let yes = FilterConfig::new().with_hazard(HazardFilter::Yes).to_query();
        assert_eq!(hazard_predicates(&yes.sql), 1);
        assert!(yes.sql.contains("a.is_potentially_hazardous_asteroid = 1"));

        let no = FilterConfig::new().with_hazard(HazardFilter::No).to_query();
        assert_eq!(hazard_predicates(&no.sql), 1);
        assert!(no.sql.contains("a.is_potentially_hazardous_asteroid = 0"));
    }

    #[test]
    fn test_dates_are_bound_not_spliced() {
        let q = FilterConfig::new()
            .with_after_date(ymd(2024, 6, 1))
            .with_before_date(ymd(2024, 12, 31))
            .to_query();

        assert!(q.sql.contains("date(ca.close_approach_date) >= date(?1)"));
        assert!(q.sql.contains("date(ca.close_approach_date) <= date(?2)"));
        assert!(!q.sql.contains("2024"));
        assert_eq!(
            q.params,
            vec![
                Value::Text("2024-06-01".to_string()),
                Value::Text("2024-12-31".to_string()),
            ]
        );
    }

    #[test]
    fn test_distance_channels_use_their_own_columns() {
        let au = FilterConfig::new().with_au(0.0, 0.05).to_query();
        assert!(au.sql.contains("ca.astronomical BETWEEN ?1 AND ?2"));
        assert!(!au.sql.contains("miss_distance_km BETWEEN"));
        assert!(!au.sql.contains("miss_distance_lunar BETWEEN"));

        let ld = FilterConfig::new().with_ld(0.0, 10.0).to_query();
        assert!(ld.sql.contains("ca.miss_distance_lunar BETWEEN ?1 AND ?2"));
        assert!(!ld.sql.contains("astronomical BETWEEN"));

        let km = FilterConfig::new().with_km(0.0, 1_000_000.0).to_query();
        assert!(km.sql.contains("ca.miss_distance_km BETWEEN ?1 AND ?2"));
        assert!(!km.sql.contains("astronomical BETWEEN"));
    }

    #[test]
    fn test_diameter_match_modes() {
        let within = FilterConfig::new()
            .with_diameter(0.1, 0.5, DiameterMatch::MaxWithin)
            .to_query();
        assert!(within.sql.contains("a.estimated_diameter_max_km BETWEEN ?1 AND ?2"));
        assert!(!within.sql.contains("estimated_diameter_min_km >="));

        let envelope = FilterConfig::new()
            .with_diameter(0.1, 0.5, DiameterMatch::Envelope)
            .to_query();
        assert!(envelope.sql.contains("a.estimated_diameter_min_km >= ?1"));
        assert!(envelope.sql.contains("a.estimated_diameter_max_km <= ?2"));
        assert_eq!(envelope.params, vec![Value::Real(0.1), Value::Real(0.5)]);
    }

    #[test]
    fn test_predicate_order_and_numbering() {
        let q = FilterConfig::new()
            .with_hazard(HazardFilter::Yes)
            .with_km(1.0, 2.0)
            .with_velocity(10.0, 20.0)
            .with_after_date(ymd(2024, 1, 1))
            .to_query();

        let date = q.sql.find("date(?1)").unwrap();
        let velocity = q.sql.find("relative_velocity_kmph BETWEEN ?2 AND ?3").unwrap();
        let km = q.sql.find("miss_distance_km BETWEEN ?4 AND ?5").unwrap();
        let hazard = q.sql.find("is_potentially_hazardous_asteroid = 1").unwrap();
        assert!(date < velocity && velocity < km && km < hazard);
        assert_eq!(q.param_count(), 5);
    }

    #[test]
    fn test_zero_velocity_range_still_builds() {
        let q = FilterConfig::new().with_velocity(0.0, 0.0).to_query();
        assert!(q.sql.contains("ca.relative_velocity_kmph BETWEEN ?1 AND ?2"));
        assert_eq!(q.params, vec![Value::Real(0.0), Value::Real(0.0)]);
    }

    #[test]
    fn test_inverted_range_builds_but_fails_validation() {
        let config = FilterConfig::new().with_au(0.5, 0.1);
        let q = config.to_query();
        assert_eq!(q.param_count(), 2);
        assert!(matches!(config.validate(), Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn test_validation() {
        assert!(FilterConfig::dashboard_defaults().validate().is_ok());
        assert!(FilterConfig::new().with_magnitude(-1.0, 30.0).validate().is_ok());
        assert!(FilterConfig::new().with_ld(-1.0, 3.0).validate().is_err());
        assert!(FilterConfig::new().with_velocity(f64::NAN, 1.0).validate().is_err());

        let dates = FilterConfig::new()
            .with_after_date(ymd(2024, 6, 2))
            .with_before_date(ymd(2024, 6, 1));
        assert!(dates.validate().is_err());
    }

    #[test]
    fn test_bounds_and_hazard_parsing() {
        assert_eq!("0:0.05".parse::<Bounds>().unwrap(), Bounds::new(0.0, 0.05));
        assert_eq!(" 10 : 20 ".parse::<Bounds>().unwrap(), Bounds::new(10.0, 20.0));
        assert!("10".parse::<Bounds>().is_err());
        assert!("a:b".parse::<Bounds>().is_err());

        assert_eq!("Yes".parse::<HazardFilter>().unwrap(), HazardFilter::Yes);
        assert_eq!("both".parse::<HazardFilter>().unwrap(), HazardFilter::Both);
        assert!("maybe".parse::<HazardFilter>().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let config: FilterConfig = toml::from_str(
            r#"
            after_date = "2024-06-01"
            hazard = "Yes"
            diameter_match = "envelope"
            au_range = { min = 0.0, max = 0.05 }
            "#,
        )
        .unwrap();

        assert_eq!(config.after_date, Some(ymd(2024, 6, 1)));
        assert_eq!(config.hazard, HazardFilter::Yes);
        assert_eq!(config.diameter_match, DiameterMatch::Envelope);
        assert_eq!(config.au_range, Some(Bounds::new(0.0, 0.05)));
        assert!(config.velocity_range.is_none());
    }

    fn bounds_strategy() -> impl Strategy<Value = Option<Bounds>> {
        proptest::option::of((-1.0e6f64..1.0e6, -1.0e6f64..1.0e6).prop_map(|(a, b)| Bounds::new(a, b)))
    }

    fn date_strategy() -> impl Strategy<Value = Option<NaiveDate>> {
        proptest::option::of((1990i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| ymd(y, m, d)))
    }

    fn config_strategy() -> impl Strategy<Value = FilterConfig> {
        (
            (date_strategy(), date_strategy()),
            (bounds_strategy(), bounds_strategy(), bounds_strategy()),
            (bounds_strategy(), bounds_strategy(), bounds_strategy()),
            any::<bool>(),
            0u8..3,
        )
            .prop_map(|((after, before), (vel, diam, mag), (au, ld, km), envelope, hazard)| FilterConfig {
                after_date: after,
                before_date: before,
                velocity_range: vel,
                diameter_range: diam,
                diameter_match: if envelope { DiameterMatch::Envelope } else { DiameterMatch::MaxWithin },
                magnitude_range: mag,
                au_range: au,
                ld_range: ld,
                km_range: km,
                hazard: match hazard {
                    0 => HazardFilter::Both,
                    1 => HazardFilter::Yes,
                    _ => HazardFilter::No,
                },
            })
    }

    proptest! {
        #[test]
        fn prop_build_is_deterministic(config in config_strategy()) {
            let first = FilterQueryBuilder::build(&config);
            let second = FilterQueryBuilder::build(&config.clone());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_placeholders_match_params(config in config_strategy()) {
            let q = FilterQueryBuilder::build(&config);
            prop_assert_eq!(q.sql.matches('?').count(), q.params.len());
            let last = format!("?{}", q.params.len());
            prop_assert!(q.sql.contains(&last) || q.params.is_empty());
        }
    }
}
