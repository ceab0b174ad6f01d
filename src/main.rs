mod types;
mod error;
mod config;
mod indicators;
mod normalize;
mod regime;
mod score;
mod leading;
mod patterns;
mod ingest;
mod engine;
mod database;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{load_config, MonitorConfig};
use database::Database;
use engine::LiquidityPipeline;
use ingest::{fetch_all, JsonFileSource};
use patterns::analyze_patterns;
use types::SeriesKey;

#[derive(Parser)]
#[command(name = "liquidity-monitor")]
#[command(version = "0.1.0")]
#[command(about = "Central-bank liquidity regime monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "liquidity.toml")]
    config: String,

    /// Database URL, overrides the configured one
    #[arg(long, global = true)]
    db: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize, classify and score a date range, then persist it
    Run {
        /// JSON export of raw observations keyed by series id
        #[arg(short, long)]
        input: String,
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,
    },
    /// Print the regime snapshot for a date (latest when omitted)
    Show {
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Cycles, liquidity regime and anomalies over the trailing window
    Patterns {
        /// Number of trailing records to analyze
        #[arg(short, long, default_value = "365")]
        window: usize,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config)?;
    let db_url = cli.db.unwrap_or_else(|| config.general.database_url.clone());

    match cli.command {
        Commands::Run { input, start, end } => {
            run_pipeline(config, &input, &start, &end, &db_url).await?;
        }
        Commands::Show { date } => {
            show_snapshot(&db_url, date.as_deref()).await?;
        }
        Commands::Patterns { window } => {
            show_patterns(&config, &db_url, window).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn parse_date(value: &str, label: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid {} date format. Use YYYY-MM-DD", label))
}

async fn run_pipeline(config: MonitorConfig, input: &str, start: &str, end: &str, db_url: &str) -> Result<()> {
    let start_date = parse_date(start, "start")?;
    let end_date = parse_date(end, "end")?;
    if end_date < start_date {
        return Err(anyhow!("End date must not be before start date"));
    }

    info!("Processing {} to {} from {}", start_date, end_date, input);

    let source = JsonFileSource::open(input).await?;
    let observations = fetch_all(&source).await;

    let db = Database::new(db_url).await?;

    // Enough history for the momentum windows and the first deltas of the range
    let lookback = (config.score.window + config.score.momentum_window).max(config.general.delta_horizon);
    let prior = db.records_before(start_date, lookback as u32).await?;
    info!("Loaded {} prior records", prior.len());

    let pipeline = LiquidityPipeline::new(config);
    let records = pipeline.run(&observations, &prior, start_date, end_date);
    db.upsert_records(&records).await?;

    match records.last() {
        Some(latest) => {
            let snapshot = latest.snapshot();
            info!("{}", snapshot.headline());
            for key in SeriesKey::ALL {
                if let Some(value) = latest.value(key) {
                    let (shown, unit) = key.unit().to_display(value);
                    info!("  {:<14} {:>12.2} {}", key.as_str(), shown, unit);
                }
            }
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => warn!("No records produced for {} to {}", start_date, end_date),
    }

    Ok(())
}

async fn show_snapshot(db_url: &str, date: Option<&str>) -> Result<()> {
    let db = Database::new(db_url).await?;

    let record = match date {
        Some(date) => db.record_for(parse_date(date, "snapshot")?).await?,
        None => db.latest().await?,
    };

    match record {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record.snapshot())?),
        None => warn!("No stored record found"),
    }

    Ok(())
}

async fn show_patterns(config: &MonitorConfig, db_url: &str, window: usize) -> Result<()> {
    let db = Database::new(db_url).await?;

    let records = db.all_records().await?;
    let from = records.len().saturating_sub(window);
    let report = analyze_patterns(&records[from..], &config.patterns);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
