//! CSV stream file persistence
//!
//! The stream file is the shared medium between the generator daemon and
//! the reporting CLI. Loading is lenient: rows that cannot yield a usable
//! reading are skipped and counted, never fatal.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::alerting::ClassifiedReading;
use crate::error::MonitorError;
use crate::generator::{async_trait, sanitize_previous, ReadingSink};
use crate::models::{Reading, TIMESTAMP_FORMAT};
use crate::scoring::ZoneScore;
use crate::zones::ZoneId;

/// Tokens read as an absent value
const MISSING_TOKENS: &[&str] = &["", "NaN", "nan", "NULL", "null"];

/// Timestamp layouts accepted on read
const ACCEPTED_TIMESTAMP_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// One row of the stream file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StreamRecord {
    timestamp: Option<String>,
    zone_id: Option<String>,
    temperature: Option<String>,
    humidity: Option<String>,
    temp_threshold: Option<String>,
    humidity_threshold: Option<String>,
}

impl StreamRecord {
    fn from_reading(reading: &Reading) -> Self {
        let profile = reading.zone.profile();
        Self {
            timestamp: Some(reading.timestamp_label()),
            zone_id: Some(reading.zone.as_str().to_string()),
            temperature: Some(reading.temperature.to_string()),
            humidity: reading.humidity.map(|h| h.to_string()),
            temp_threshold: Some(profile.temp_threshold_label()),
            humidity_threshold: Some(profile.humidity_threshold_label()),
        }
    }

    fn into_reading(self) -> std::result::Result<Reading, SkipReason> {
        let zone: ZoneId = self
            .zone_id
            .as_deref()
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|_| SkipReason::UnknownZone)?;
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or(SkipReason::BadTimestamp)?;
        let temperature =
            parse_value(self.temperature.as_deref()).ok_or(SkipReason::MissingTemperature)?;
        let humidity = parse_value(self.humidity.as_deref());

        Ok(Reading::new(zone, timestamp, temperature, humidity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Malformed,
    UnknownZone,
    BadTimestamp,
    MissingTemperature,
}

/// Rows dropped while loading, by cause
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRows {
    pub malformed: usize,
    pub unknown_zone: usize,
    pub bad_timestamp: usize,
    pub missing_temperature: usize,
}

impl SkippedRows {
    pub fn total(&self) -> usize {
        self.malformed + self.unknown_zone + self.bad_timestamp + self.missing_temperature
    }

    fn count(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Malformed => self.malformed += 1,
            SkipReason::UnknownZone => self.unknown_zone += 1,
            SkipReason::BadTimestamp => self.bad_timestamp += 1,
            SkipReason::MissingTemperature => self.missing_temperature += 1,
        }
    }
}

/// Result of loading a stream file, in file order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamLoad {
    pub readings: Vec<Reading>,
    pub skipped: SkippedRows,
}

impl StreamLoad {
    /// Latest reading per zone
    pub fn latest_by_zone(&self) -> HashMap<ZoneId, Reading> {
        let mut latest = HashMap::new();
        for reading in &self.readings {
            latest.insert(reading.zone, reading.clone());
        }
        latest
    }
}

/// Parse a numeric cell, treating missing tokens and non-finite values as absent
pub fn parse_value(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if MISSING_TOKENS.contains(&raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a stream timestamp in any accepted layout
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Load readings from any CSV source
pub fn read_stream<R: Read>(reader: R) -> Result<StreamLoad> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut load = StreamLoad::default();
    for (index, result) in rdr.deserialize::<StreamRecord>().enumerate() {
        let outcome = match result {
            Ok(record) => record.into_reading(),
            Err(e) => {
                debug!(row = index + 1, error = %e, "Malformed stream row");
                Err(SkipReason::Malformed)
            }
        };
        match outcome {
            Ok(reading) => load.readings.push(reading),
            Err(reason) => {
                if reason == SkipReason::MissingTemperature {
                    let err = MonitorError::MissingField {
                        field: "temperature",
                    };
                    debug!(row = index + 1, error = %err, "Skipping stream row");
                }
                load.skipped.count(reason);
            }
        }
    }

    if load.skipped.total() > 0 {
        warn!(
            readings = load.readings.len(),
            skipped = load.skipped.total(),
            "Skipped unusable stream rows"
        );
    }
    Ok(load)
}

/// Load the stream file at `path`
pub fn load_stream(path: &Path) -> Result<StreamLoad> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open stream file {}", path.display()))?;
    read_stream(file).with_context(|| format!("Failed to read stream file {}", path.display()))
}

/// Append readings to the stream file
///
/// Writes the header only when the file is new or empty.
pub fn append_readings(path: &Path, readings: &[Reading]) -> Result<()> {
    let needs_header = std::fs::metadata(path)
        .map(|m| m.len() == 0)
        .unwrap_or(true);
    debug!(path = %path.display(), needs_header, rows = readings.len(), "Appending readings");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open stream file {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for reading in readings {
        writer.serialize(StreamRecord::from_reading(reading))?;
    }
    writer.flush()?;

    Ok(())
}

/// Stream file sink used by the generator daemon
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReadingSink for CsvSink {
    async fn append(&self, readings: &[Reading]) -> Result<()> {
        let path = self.path.clone();
        let readings = readings.to_vec();
        tokio::task::spawn_blocking(move || append_readings(&path, &readings))
            .await
            .context("Stream writer task failed")?
    }

    async fn last_readings(&self) -> Result<HashMap<ZoneId, Reading>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || last_readings(&path))
            .await
            .context("Stream reader task failed")?
    }
}

/// Most recent complete reading per zone, with implausible values repaired
///
/// Rows without humidity are passed over while the zone has an earlier
/// complete row. A missing or empty file yields no previous readings.
pub fn last_readings(path: &Path) -> Result<HashMap<ZoneId, Reading>> {
    let is_empty = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    if is_empty {
        return Ok(HashMap::new());
    }

    let load = load_stream(path)?;
    let mut latest = load.latest_by_zone();
    for reading in load.readings.iter().filter(|r| r.humidity.is_some()) {
        latest.insert(reading.zone, reading.clone());
    }

    Ok(latest
        .into_iter()
        .map(|(zone, reading)| {
            let (temperature, humidity) = sanitize_previous(zone.profile(), &reading);
            (
                zone,
                Reading::new(zone, reading.timestamp, temperature, Some(humidity)),
            )
        })
        .collect())
}

#[derive(Debug, Serialize)]
struct ClassifiedRecord<'a> {
    timestamp: String,
    zone_id: &'a str,
    temperature: f64,
    humidity: Option<f64>,
    severity: String,
    alert_flag: bool,
    humidity_in_band: Option<bool>,
}

/// Write classified readings as CSV
pub fn export_classified<W: Write>(writer: W, classified: &[ClassifiedReading]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    for c in classified {
        writer.serialize(ClassifiedRecord {
            timestamp: c.reading.timestamp_label(),
            zone_id: c.reading.zone.as_str(),
            temperature: c.reading.temperature,
            humidity: c.reading.humidity,
            severity: c.severity.to_string(),
            alert_flag: c.alert_flag,
            humidity_in_band: c.humidity_in_band,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write classified readings to a new CSV file
pub fn export_classified_to_path(path: &Path, classified: &[ClassifiedReading]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    export_classified(file, classified)
}

/// Write zone scores as CSV
pub fn export_scores<W: Write>(writer: W, scores: &[ZoneScore]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    for score in scores {
        writer.serialize(score)?;
    }
    writer.flush()?;
    Ok(())
}
