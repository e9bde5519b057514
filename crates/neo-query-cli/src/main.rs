//! neo-query command-line front end
//!
//! Run with: cargo run -p neo-query-cli -- --db Asteroid_Data.db run "3. Top 10 fastest asteroids"

mod render;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use neo_query::{
    AsteroidDb, Bounds, ChartHint, DatasetOverview, DiameterMatch, FilterConfig,
    FilterQueryBuilder, FilterSummary, HazardFilter, NeoQueryConfig, OutputFormat, QueryCatalog,
    QueryCategory, QueryExecutor, Table,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::render::Renderer;

#[derive(Parser, Debug)]
#[command(name = "neo-query", version, about = "Near-Earth asteroid query catalog and filters")]
struct Cli {
    /// SQLite dataset (overrides the config file)
    #[arg(long, global = true, env = "NEO_QUERY_DB")]
    db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, short = 'f', global = true, value_enum)]
    format: Option<FormatArg>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog labels grouped by category
    List {
        /// Only this category (statistical, hazard, speed_motion, distance_size, temporal, special)
        #[arg(long)]
        category: Option<String>,
    },
    /// Run a catalog query by label
    Run {
        /// Exact catalog label, e.g. "3. Top 10 fastest asteroids"
        label: String,
        /// Print the SQL before running it
        #[arg(long)]
        show_sql: bool,
    },
    /// Filter close approaches by date, velocity, size, distance and hazard
    Filter(FilterArgs),
    /// Dump a raw table
    Browse {
        #[arg(value_enum)]
        table: TableArg,
        /// Maximum rows to fetch
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Dataset totals and hazard rate
    Overview,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Start from the dashboard's initial filter values
    #[arg(long)]
    defaults: bool,
    /// Approaches on or after this date (YYYY-MM-DD)
    #[arg(long)]
    after: Option<NaiveDate>,
    /// Approaches on or before this date (YYYY-MM-DD)
    #[arg(long)]
    before: Option<NaiveDate>,
    /// Relative velocity range in km/h, MIN:MAX
    #[arg(long, allow_hyphen_values = true)]
    velocity: Option<Bounds>,
    /// Estimated diameter range in km, MIN:MAX
    #[arg(long, allow_hyphen_values = true)]
    diameter: Option<Bounds>,
    /// Require min diameter >= MIN and max diameter <= MAX instead of max diameter within range
    #[arg(long)]
    envelope: bool,
    /// Absolute magnitude (H) range, MIN:MAX
    #[arg(long, allow_hyphen_values = true)]
    magnitude: Option<Bounds>,
    /// Miss distance in astronomical units, MIN:MAX
    #[arg(long, allow_hyphen_values = true)]
    au: Option<Bounds>,
    /// Miss distance in lunar distances, MIN:MAX
    #[arg(long, allow_hyphen_values = true)]
    ld: Option<Bounds>,
    /// Miss distance in kilometres, MIN:MAX
    #[arg(long, allow_hyphen_values = true)]
    km: Option<Bounds>,
    /// Potentially hazardous: both, yes or no
    #[arg(long)]
    hazard: Option<HazardFilter>,
    /// Reject inverted or negative ranges instead of returning no rows
    #[arg(long)]
    strict: bool,
    /// Print match count, mean velocity, closest miss and hazardous count
    #[arg(long)]
    summary: bool,
    /// Print the SQL and bound parameters before running it
    #[arg(long)]
    show_sql: bool,
}

impl FilterArgs {
    /// Layer command-line bounds over a starting filter
    fn apply(&self, base: FilterConfig) -> FilterConfig {
        let mut filter = if self.defaults {
            FilterConfig::dashboard_defaults()
        } else {
            base
        };

        if self.after.is_some() {
            filter.after_date = self.after;
        }
        if self.before.is_some() {
            filter.before_date = self.before;
        }
        if self.velocity.is_some() {
            filter.velocity_range = self.velocity;
        }
        if self.diameter.is_some() {
            filter.diameter_range = self.diameter;
        }
        if self.envelope {
            filter.diameter_match = DiameterMatch::Envelope;
        }
        if self.magnitude.is_some() {
            filter.magnitude_range = self.magnitude;
        }
        if self.au.is_some() {
            filter.au_range = self.au;
        }
        if self.ld.is_some() {
            filter.ld_range = self.ld;
        }
        if self.km.is_some() {
            filter.km_range = self.km;
        }
        if let Some(hazard) = self.hazard {
            filter.hazard = hazard;
        }

        filter
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Table,
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TableArg {
    Asteroids,
    CloseApproaches,
}

impl From<TableArg> for Table {
    fn from(arg: TableArg) -> Self {
        match arg {
            TableArg::Asteroids => Table::Asteroids,
            TableArg::CloseApproaches => Table::CloseApproaches,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "neo_query=debug" } else { "neo_query=warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mut config = NeoQueryConfig::load(cli.config.as_deref()).with_context(|| {
        format!(
            "Failed to load configuration{}",
            cli.config
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        )
    })?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }

    let catalog = QueryCatalog::new()
        .with_entries(config.queries.clone())
        .context("Invalid custom query in configuration")?;
    let renderer = Renderer::new(config.output.format, config.output.max_rows);

    match &cli.command {
        Command::List { category } => {
            let only = match category {
                Some(id) => Some(
                    QueryCategory::from_id(id)
                        .with_context(|| format!("Unknown category: {}", id))?,
                ),
                None => None,
            };
            renderer.catalog(&catalog, only)?;
        }
        Command::Run { label, show_sql } => {
            let sql = catalog.get(label)?;
            if *show_sql {
                render::print_sql(sql, &[]);
            }
            let db = open_db(&config)?;
            let result = db.run_catalog(&catalog, label)?;
            renderer.result(&result, ChartHint::for_result(&result).as_ref())?;
        }
        Command::Filter(args) => {
            let filter = args.apply(config.filters.clone());
            if args.strict {
                filter.validate()?;
            }

            let query = FilterQueryBuilder::build(&filter);
            if args.show_sql {
                render::print_sql(&query.sql, &query.params);
            }

            let db = open_db(&config)?;
            let result = db.run(&query)?;
            if args.summary {
                renderer.filtered(&result, &FilterSummary::from_result(&result))?;
            } else {
                renderer.result(&result, None)?;
            }
        }
        Command::Browse { table, limit } => {
            let db = open_db(&config)?;
            let result = db.browse((*table).into(), *limit)?;
            renderer.result(&result, None)?;
        }
        Command::Overview => {
            let db = open_db(&config)?;
            renderer.overview(&DatasetOverview::load(&db)?)?;
        }
    }

    Ok(())
}

fn open_db(config: &NeoQueryConfig) -> Result<AsteroidDb> {
    tracing::debug!(path = %config.database.path.display(), "Opening dataset");
    let db = AsteroidDb::open_with(&config.database).with_context(|| {
        format!(
            "Cannot open dataset at {} (set --db or NEO_QUERY_DB)",
            config.database.path.display()
        )
    })?;
    db.check_schema()?;
    Ok(db)
}
