//! Output rendering: aligned text tables, JSON and CSV

use anyhow::Result;
use colored::Colorize;
use neo_query::types::value_to_display;
use neo_query::{
    ChartHint, DatasetOverview, FilterSummary, OutputFormat, QueryCatalog, QueryCategory,
    ResultSet, Value,
};
use serde::Serialize;
use std::io::{self, Write};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Writes results to stdout in the configured format
pub struct Renderer {
    format: OutputFormat,
    max_rows: Option<usize>,
}

#[derive(Serialize)]
struct CategoryListing<'a> {
    category: QueryCategory,
    title: &'static str,
    labels: Vec<&'a str>,
}

#[derive(Serialize)]
struct ResultDocument<'a> {
    columns: &'a [String],
    rows: &'a ResultSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a ChartHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a FilterSummary>,
}

impl Renderer {
    pub fn new(format: OutputFormat, max_rows: Option<usize>) -> Self {
        Self { format, max_rows }
    }

    /// Catalog labels, grouped
    pub fn catalog(&self, catalog: &QueryCatalog, only: Option<QueryCategory>) -> Result<()> {
        let groups: Vec<CategoryListing<'_>> = catalog
            .grouped()
            .into_iter()
            .filter(|(category, _)| only.map_or(true, |c| c == *category))
            .map(|(category, entries)| CategoryListing {
                category,
                title: category.title(),
                labels: entries.iter().map(|e| e.label.as_str()).collect(),
            })
            .collect();

        let mut out = io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut out, &groups)?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                writer.write_record(["category", "label"])?;
                for group in &groups {
                    for label in &group.labels {
                        writer.write_record([group.category.as_str(), *label])?;
                    }
                }
                writer.flush()?;
            }
            OutputFormat::Table => {
                for group in &groups {
                    writeln!(out, "{}", group.title.bold())?;
                    for label in &group.labels {
                        writeln!(out, "  {}", label)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// A query result, with an optional chart suggestion
    pub fn result(&self, result: &ResultSet, chart: Option<&ChartHint>) -> Result<()> {
        self.write_result(result, chart, None)
    }

    /// A filter result followed by its summary
    pub fn filtered(&self, result: &ResultSet, summary: &FilterSummary) -> Result<()> {
        self.write_result(result, None, Some(summary))
    }

    fn write_result(
        &self,
        result: &ResultSet,
        chart: Option<&ChartHint>,
        summary: Option<&FilterSummary>,
    ) -> Result<()> {
        let mut out = io::stdout().lock();

        match self.format {
            OutputFormat::Json => {
                let document = ResultDocument {
                    columns: result.columns(),
                    rows: result,
                    chart,
                    summary,
                };
                serde_json::to_writer_pretty(&mut out, &document)?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                writer.write_record(result.columns())?;
                for row in result.rows() {
                    writer.write_record(row.values().iter().map(value_to_display))?;
                }
                writer.flush()?;
            }
            OutputFormat::Table => {
                write_table(&mut out, result, self.max_rows)?;
                if let Some(chart) = chart {
                    writeln!(out, "{}", describe_chart(chart).dimmed())?;
                }
                if let Some(summary) = summary {
                    write_summary(&mut out, summary)?;
                }
            }
        }

        Ok(())
    }

    /// Dataset totals
    pub fn overview(&self, overview: &DatasetOverview) -> Result<()> {
        let mut out = io::stdout().lock();

        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut out, overview)?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                writer.write_record([
                    "total_asteroids",
                    "total_approaches",
                    "hazardous_count",
                    "hazard_rate_percent",
                ])?;
                writer.write_record([
                    overview.total_asteroids.to_string(),
                    overview.total_approaches.to_string(),
                    overview.hazardous_count.to_string(),
                    format!("{:.1}", overview.hazard_rate_percent),
                ])?;
                writer.flush()?;
            }
            OutputFormat::Table => {
                writeln!(out, "{:<26}{}", "Total asteroids tracked".bold(), overview.total_asteroids)?;
                writeln!(out, "{:<26}{}", "Close approaches recorded".bold(), overview.total_approaches)?;
                writeln!(out, "{:<26}{}", "Potentially hazardous".bold(), overview.hazardous_count)?;
                writeln!(out, "{:<26}{:.1}%", "Hazard rate".bold(), overview.hazard_rate_percent)?;
            }
        }

        Ok(())
    }
}

/// SQL and bound parameters, on stderr so stdout stays parseable
pub fn print_sql(sql: &str, params: &[Value]) {
    eprintln!("{}", sql.trim().cyan());
    for (idx, value) in params.iter().enumerate() {
        eprintln!("  ?{} = {}", idx + 1, value_to_display(value));
    }
}

fn write_table<W: Write>(out: &mut W, result: &ResultSet, max_rows: Option<usize>) -> Result<()> {
    let shown = max_rows.unwrap_or(usize::MAX).min(result.len());

    let mut builder = Builder::default();
    builder.push_record(result.columns().iter().cloned());
    for row in &result.rows()[..shown] {
        builder.push_record(row.values().iter().map(value_to_display));
    }

    let mut table = builder.build();
    table.with(Style::blank());
    for line in table.to_string().lines() {
        writeln!(out, "{}", line.trim_end())?;
    }

    if shown < result.len() {
        writeln!(out, "({} of {} rows)", shown, result.len())?;
    } else {
        writeln!(out, "({} rows)", result.len())?;
    }

    Ok(())
}

fn write_summary<W: Write>(out: &mut W, summary: &FilterSummary) -> Result<()> {
    if summary.matches == 0 {
        writeln!(out, "{}", "No approaches match these filters.".yellow())?;
        return Ok(());
    }

    writeln!(out, "{}", format!("Found {} matching approaches", summary.matches).green())?;
    if let Some(v) = summary.avg_velocity_kmph {
        writeln!(out, "  Average velocity: {:.0} km/h", v)?;
    }
    if let Some(km) = summary.closest_miss_km {
        writeln!(out, "  Closest approach: {:.0} km", km)?;
    }
    if let Some(n) = summary.hazardous_in_results {
        writeln!(out, "  Hazardous count: {}", n)?;
    }

    Ok(())
}

fn describe_chart(chart: &ChartHint) -> String {
    match chart {
        ChartHint::Bar { x, y, rows } => {
            format!("Suggested chart: bar of {} by {} (first {} rows)", y, x, rows)
        }
        ChartHint::Histogram { column, rows } => {
            format!("Suggested chart: histogram of {} (first {} rows)", column, rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["month".to_string(), "total".to_string()],
            vec![
                vec![Value::Text("2024-08".to_string()), Value::Integer(4)],
                vec![Value::Text("2024-07".to_string()), Value::Integer(3)],
                vec![Value::Text("2024-01".to_string()), Value::Integer(1)],
            ],
        )
    }

    #[test]
    fn test_table_alignment_and_cap() {
        let mut buf = Vec::new();
        write_table(&mut buf, &sample(), Some(2)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        let cells = |line: &str| line.split_whitespace().map(String::from).collect::<Vec<_>>();
        assert_eq!(cells(lines[0]), ["month", "total"]);
        assert_eq!(cells(lines[1]), ["2024-08", "4"]);
        assert_eq!(cells(lines[2]), ["2024-07", "3"]);
        assert_eq!(lines[0].find("total"), lines[1].rfind('4'));
        assert_eq!(lines[3], "(2 of 3 rows)");
    }

    #[test]
    fn test_table_without_cap_counts_all_rows() {
        let mut buf = Vec::new();
        write_table(&mut buf, &sample(), None).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("2024-01"));
        assert!(text.ends_with("(3 rows)\n"));
    }

    #[test]
    fn test_describe_chart() {
        let chart = ChartHint::for_result(&sample()).unwrap();
        assert_eq!(
            describe_chart(&chart),
            "Suggested chart: bar of total by month (first 3 rows)"
        );
    }
}
