//! CLI command implementations

pub mod alerts;
pub mod costs;
pub mod export;
pub mod performance;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use monitor_lib::{
    stream,
    summary::{Analyzer, DateRange, SystemReport, ZoneReport},
    Reading, ZoneId,
};
use tracing::debug;

use crate::output::OutputFormat;

/// Loaded stream plus everything needed to analyze it
pub struct StreamContext {
    pub analyzer: Analyzer,
    pub readings: Vec<Reading>,
    /// Evaluation instant for freshness and recent-alert windows
    pub now: NaiveDateTime,
    pub format: OutputFormat,
}

impl StreamContext {
    pub fn load(
        data: &Path,
        analyzer: Analyzer,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        format: OutputFormat,
    ) -> Result<Self> {
        let range = DateRange::new(from, to)?;
        let load = stream::load_stream(data)
            .with_context(|| format!("Failed to load sensor stream {}", data.display()))?;

        let readings = range.filter(&load.readings);
        debug!(
            loaded = load.readings.len(),
            in_range = readings.len(),
            malformed = load.skipped.malformed,
            unknown_zone = load.skipped.unknown_zone,
            bad_timestamp = load.skipped.bad_timestamp,
            missing_temperature = load.skipped.missing_temperature,
            "Sensor stream loaded"
        );

        Ok(Self {
            analyzer,
            readings,
            now: Local::now().naive_local(),
            format,
        })
    }

    pub fn zone_report(&self, zone: ZoneId) -> Result<ZoneReport> {
        self.analyzer
            .zone_report(zone, &self.readings, self.now)
            .with_context(|| format!("Failed to analyze {}", zone))
    }

    pub fn system_report(&self) -> Result<SystemReport> {
        self.analyzer
            .system_report(&self.readings, self.now)
            .context("Failed to analyze sensor stream")
    }
}
