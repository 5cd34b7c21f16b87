//! Cold-storage monitor CLI
//!
//! Reads the sensor stream file written by the generator and renders zone
//! status, alerts, performance scores, cost impact and trend forecasts.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commands::{alerts, costs, export, performance, status, StreamContext};
use monitor_lib::{AlertSensitivity, ZoneId};
use tracing_subscriber::EnvFilter;

/// Cold-storage warehouse monitor CLI
#[derive(Parser)]
#[command(name = "coldstore")]
#[command(author, version, about = "CLI for the cold-storage warehouse monitor", long_about = None)]
pub struct Cli {
    /// Sensor stream CSV file (can also be set via COLDSTORE_DATA env var)
    #[arg(
        long,
        env = "COLDSTORE_DATA",
        default_value = "simulated_warehouse_data_30min_demo.csv"
    )]
    pub data: PathBuf,

    /// Threshold override file (defaults to ~/.config/coldstore/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Only include readings on or after this day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only include readings on or before this day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the status overview for all zones
    Zones,

    /// Show recent classified readings for a zone
    Readings {
        /// Zone id (e.g. Z1-Freezer) or name (e.g. freezer)
        zone: ZoneId,

        /// Number of readings to show
        #[arg(long, short, default_value_t = 15)]
        limit: usize,
    },

    /// Show alert history for a zone
    Alerts {
        /// Zone id (e.g. Z4-Pharma) or name (e.g. pharma)
        zone: ZoneId,

        /// Override the zone's alert sensitivity (low, medium, high, critical)
        #[arg(long)]
        sensitivity: Option<AlertSensitivity>,
    },

    /// Show performance score breakdown
    Score {
        /// Zone to break down (shows all zones if not specified)
        zone: Option<ZoneId>,

        /// Also save the all-zones score table as CSV
        #[arg(long, short, conflicts_with = "zone")]
        output: Option<PathBuf>,
    },

    /// Show zone-specific metrics and the deviation report
    Analyze {
        /// Zone id (e.g. Z3-Produce) or name (e.g. produce)
        zone: ZoneId,
    },

    /// Show cost impact and savings opportunities
    Costs,

    /// Show temperature trend predictions and risk
    Forecast,

    /// Export classified readings for a zone to CSV
    Export {
        /// Zone id (e.g. Z2-Chiller) or name (e.g. chiller)
        zone: ZoneId,

        /// Output file path
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let overrides = config::Config::load(cli.config.as_deref())?;
    let ctx = StreamContext::load(
        &cli.data,
        overrides.analyzer()?,
        cli.from,
        cli.to,
        cli.format,
    )?;

    match cli.command {
        Commands::Zones => status::show_zones(&ctx)?,
        Commands::Readings { zone, limit } => status::show_readings(&ctx, zone, limit)?,
        Commands::Alerts { zone, sensitivity } => alerts::show_alerts(&ctx, zone, sensitivity)?,
        Commands::Score { zone, output } => match zone {
            Some(zone) => performance::show_zone_score(&ctx, zone)?,
            None => performance::show_scores(&ctx, output.as_deref())?,
        },
        Commands::Analyze { zone } => performance::show_analysis(&ctx, zone)?,
        Commands::Costs => costs::show_costs(&ctx)?,
        Commands::Forecast => performance::show_forecast(&ctx)?,
        Commands::Export { zone, output } => export::export_zone(&ctx, zone, &output)?,
    }

    Ok(())
}
