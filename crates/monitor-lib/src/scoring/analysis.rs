//! Zone-specific condition analysis
//!
//! Each zone stores something different, so each cares about a different
//! view of the same stream:
//! - chiller: energy score from temperature stability, drift from band centre
//! - produce: freshness score mixing compliance, stability and humidity
//! - pharma: regulatory compliance with a penalty per critical deviation,
//!   plus a deviation report
//!
//! All metrics are computed for every zone over the full classified stream.
//! [`ZoneAnalysis::headline`] picks the one that matters for the zone.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::scorer::check_zone;
use super::WindowStats;
use crate::alerting::ClassifiedReading;
use crate::config::ThresholdConfig;
use crate::error::{MonitorError, Result};
use crate::zones::ZoneId;

/// Deviations listed in the report
const DEVIATION_REPORT_LIMIT: usize = 10;

/// Compliance points lost per critical deviation
const DEVIATION_PENALTY: f64 = 10.0;

/// Upper bound on the critical deviation penalty
const DEVIATION_PENALTY_CAP: f64 = 50.0;

/// Energy points lost per degree of standard deviation
const ENERGY_PENALTY_PER_DEGREE: f64 = 10.0;

/// Which band edge a deviating reading crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationKind {
    BelowMinimum,
    AboveMaximum,
}

impl fmt::Display for DeviationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviationKind::BelowMinimum => write!(f, "BELOW MINIMUM"),
            DeviationKind::AboveMaximum => write!(f, "ABOVE MAXIMUM"),
        }
    }
}

/// One out-of-band reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub kind: DeviationKind,
    /// Degrees past the crossed edge
    pub magnitude: f64,
}

impl Deviation {
    fn from_reading(timestamp: NaiveDateTime, temperature: f64, config: &ThresholdConfig) -> Option<Self> {
        let (kind, magnitude) = if temperature < config.temp_min() {
            (DeviationKind::BelowMinimum, config.temp_min() - temperature)
        } else if temperature > config.temp_max() {
            (DeviationKind::AboveMaximum, temperature - config.temp_max())
        } else {
            return None;
        };
        Some(Self {
            timestamp,
            temperature,
            kind,
            magnitude,
        })
    }
}

/// The metric an operator of a given zone looks at first
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Headline {
    Stability(f64),
    Energy(f64),
    Freshness(f64),
    Regulatory(f64),
}

impl fmt::Display for Headline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Headline::Stability(std) => write!(f, "Temperature stability ±{:.2}°C", std),
            Headline::Energy(score) => write!(f, "Energy score {:.0}/100", score),
            Headline::Freshness(score) => write!(f, "Freshness score {:.1}/100", score),
            Headline::Regulatory(score) => write!(f, "Regulatory compliance {:.1}/100", score),
        }
    }
}

/// Zone-specific metrics over a zone's classified stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAnalysis {
    pub zone: ZoneId,
    pub readings_analyzed: usize,
    pub temp_compliance_pct: f64,
    /// Over readings that recorded humidity; zero when none did
    pub humidity_compliance_pct: f64,
    pub temp_stability: f64,
    /// Distance of the mean temperature from the band centre
    pub avg_deviation: f64,
    pub energy_score: f64,
    pub freshness_score: f64,
    pub regulatory_score: f64,
    /// Readings beyond the band by more than the warning buffer
    pub critical_deviations: usize,
    pub deviation_count: usize,
    /// Earliest out-of-band readings, at most ten
    pub deviations: Vec<Deviation>,
}

impl ZoneAnalysis {
    /// Analyze a zone's classified stream
    pub fn analyze(
        zone: ZoneId,
        classified: &[ClassifiedReading],
        config: &ThresholdConfig,
    ) -> Result<Self> {
        config.validate()?;
        if classified.is_empty() {
            return Err(MonitorError::EmptyWindow { zone });
        }
        check_zone(zone, classified)?;

        let n = classified.len() as f64;
        let temps: Vec<f64> = classified.iter().map(|c| c.reading.temperature).collect();
        let stats = WindowStats::from_values(&temps);

        let in_band = temps.iter().filter(|t| config.temperature_in_band(**t)).count();
        let temp_compliance = in_band as f64 / n;

        let humidity: Vec<bool> = classified.iter().filter_map(|c| c.humidity_in_band).collect();
        let humidity_compliance = if humidity.is_empty() {
            0.0
        } else {
            humidity.iter().filter(|ok| **ok).count() as f64 / humidity.len() as f64
        };

        let freshness_score = ((temp_compliance * 0.5
            + 1.0 / (1.0 + stats.std_dev) * 0.25
            + humidity_compliance * 0.25)
            * 100.0)
            .clamp(0.0, 100.0);

        let buffer = config.warning_buffer();
        let critical_deviations = temps
            .iter()
            .filter(|t| **t < config.temp_min() - buffer || **t > config.temp_max() + buffer)
            .count();
        let penalty = (critical_deviations as f64 * DEVIATION_PENALTY).min(DEVIATION_PENALTY_CAP);
        let regulatory_score = (temp_compliance * 100.0 - penalty).max(0.0);

        let energy_score = (100.0 - stats.std_dev * ENERGY_PENALTY_PER_DEGREE).max(0.0);
        let centre = (config.temp_min() + config.temp_max()) / 2.0;

        let all_deviations: Vec<Deviation> = classified
            .iter()
            .filter_map(|c| Deviation::from_reading(c.reading.timestamp, c.reading.temperature, config))
            .collect();

        Ok(Self {
            zone,
            readings_analyzed: classified.len(),
            temp_compliance_pct: temp_compliance * 100.0,
            humidity_compliance_pct: humidity_compliance * 100.0,
            temp_stability: stats.std_dev,
            avg_deviation: (stats.mean - centre).abs(),
            energy_score,
            freshness_score,
            regulatory_score,
            critical_deviations,
            deviation_count: all_deviations.len(),
            deviations: all_deviations.into_iter().take(DEVIATION_REPORT_LIMIT).collect(),
        })
    }

    pub fn headline(&self) -> Headline {
        match self.zone {
            ZoneId::Freezer => Headline::Stability(self.temp_stability),
            ZoneId::Chiller => Headline::Energy(self.energy_score),
            ZoneId::Produce => Headline::Freshness(self.freshness_score),
            ZoneId::Pharma => Headline::Regulatory(self.regulatory_score),
        }
    }
}
