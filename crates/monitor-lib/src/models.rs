//! Core data models for the cold-storage monitor

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::zones::ZoneId;

/// Timestamp layout used by the stream file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single sensor sample from one zone
///
/// Readings are immutable once generated. Within a zone, stream insertion
/// order is the canonical order and timestamps are non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub zone: ZoneId,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: Option<f64>,
}

impl Reading {
    pub fn new(
        zone: ZoneId,
        timestamp: NaiveDateTime,
        temperature: f64,
        humidity: Option<f64>,
    ) -> Self {
        Self {
            zone,
            timestamp,
            temperature,
            humidity,
        }
    }

    /// Timestamp rendered the way the stream file stores it
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Readings belonging to one zone, in stream order
pub fn zone_readings(readings: &[Reading], zone: ZoneId) -> Vec<Reading> {
    readings.iter().filter(|r| r.zone == zone).cloned().collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    /// Fixed reference instant used across tests
    pub fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid fixture time")
    }

    /// One reading per minute starting at [`base_time`]
    pub fn series(zone: ZoneId, temps: &[f64]) -> Vec<Reading> {
        temps
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Reading::new(
                    zone,
                    base_time() + chrono::Duration::minutes(i as i64),
                    *t,
                    Some(60.0),
                )
            })
            .collect()
    }
}
