//! Zone performance scoring
//!
//! Computes a 0-100 composite health score from the trailing window of a
//! zone's classified readings. Four additive sub-scores:
//! - temperature (0-40): stability band scaled by band compliance
//! - alerts (0-30): step function of the alert rate
//! - data quality (0-20): missing-humidity penalty plus freshness bonus
//! - efficiency (0-10): step function of temperature variance

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::WindowStats;
use crate::alerting::ClassifiedReading;
use crate::config::ThresholdConfig;
use crate::error::{MonitorError, Result};
use crate::zones::ZoneId;

/// Default trailing window length
pub const DEFAULT_WINDOW_SIZE: usize = 50;

const TEMPERATURE_MAX: f64 = 40.0;
const ALERT_MAX: f64 = 30.0;
const DATA_QUALITY_MAX: f64 = 20.0;
const EFFICIENCY_MAX: f64 = 10.0;

/// Upper bound on the missing-humidity penalty
const MISSING_PENALTY_CAP: f64 = 10.0;

/// Composite score for one zone
///
/// Fields keep full precision; use [`ZoneScore::rounded`] for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneScore {
    pub zone: ZoneId,
    pub total_score: f64,
    pub temperature_score: f64,
    pub alert_score: f64,
    pub data_quality_score: f64,
    pub efficiency_score: f64,
    pub temp_compliance_pct: f64,
    pub alert_rate_pct: f64,
    /// Sample standard deviation of temperature over the window
    pub temp_stability: f64,
    pub data_freshness_minutes: f64,
    pub window_len: usize,
}

impl ZoneScore {
    /// Copy rounded for display: one decimal, two for stability
    pub fn rounded(&self) -> Self {
        Self {
            zone: self.zone,
            total_score: round_to(self.total_score, 1),
            temperature_score: round_to(self.temperature_score, 1),
            alert_score: round_to(self.alert_score, 1),
            data_quality_score: round_to(self.data_quality_score, 1),
            efficiency_score: round_to(self.efficiency_score, 1),
            temp_compliance_pct: round_to(self.temp_compliance_pct, 1),
            alert_rate_pct: round_to(self.alert_rate_pct, 1),
            temp_stability: round_to(self.temp_stability, 2),
            data_freshness_minutes: round_to(self.data_freshness_minutes, 1),
            window_len: self.window_len,
        }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.total_score)
    }
}

/// Qualitative band for a total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            ScoreBand::Excellent
        } else if score >= 75.0 {
            ScoreBand::Good
        } else if score >= 60.0 {
            ScoreBand::Fair
        } else if score >= 40.0 {
            ScoreBand::Poor
        } else {
            ScoreBand::Critical
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Excellent => write!(f, "Excellent"),
            ScoreBand::Good => write!(f, "Good"),
            ScoreBand::Fair => write!(f, "Fair"),
            ScoreBand::Poor => write!(f, "Poor"),
            ScoreBand::Critical => write!(f, "Critical"),
        }
    }
}

/// Scores the trailing window of a zone's classified stream
#[derive(Debug, Clone)]
pub struct PerformanceScorer {
    /// Number of most recent readings considered
    pub window_size: usize,
}

impl PerformanceScorer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    /// Score a zone at the evaluation instant `now`
    ///
    /// `readings` must be the zone's stream in non-decreasing timestamp order;
    /// only the trailing `window_size` entries are used.
    pub fn score(
        &self,
        zone: ZoneId,
        readings: &[ClassifiedReading],
        config: &ThresholdConfig,
        now: NaiveDateTime,
    ) -> Result<ZoneScore> {
        config.validate()?;

        let start = readings.len().saturating_sub(self.window_size);
        let window = &readings[start..];
        let Some(latest) = window.last() else {
            return Err(MonitorError::EmptyWindow { zone });
        };
        check_zone(zone, window)?;
        check_monotonic(zone, window)?;

        let n = window.len() as f64;
        let temps: Vec<f64> = window.iter().map(|c| c.reading.temperature).collect();
        let stats = WindowStats::from_values(&temps);

        let in_band = temps.iter().filter(|t| config.temperature_in_band(**t)).count();
        let compliance = in_band as f64 / n;
        let temperature_score = stability_band(stats.std_dev) * compliance;

        let alert_count = window.iter().filter(|c| c.alert_flag).count();
        let alert_rate_pct = alert_count as f64 / n * 100.0;
        let alert_score = alert_rate_score(alert_rate_pct);

        let missing_humidity = window
            .iter()
            .filter(|c| !c.reading.humidity.is_some_and(f64::is_finite))
            .count();
        let missing_penalty = (missing_humidity as f64 / n * DATA_QUALITY_MAX).min(MISSING_PENALTY_CAP);
        let age_minutes = (now - latest.reading.timestamp).num_milliseconds() as f64 / 60_000.0;
        let data_quality_score =
            (DATA_QUALITY_MAX - missing_penalty + freshness_bonus(age_minutes)).clamp(0.0, DATA_QUALITY_MAX);

        let efficiency_score = variance_score(stats.variance);

        let total_score =
            (temperature_score + alert_score + data_quality_score + efficiency_score).clamp(0.0, 100.0);

        Ok(ZoneScore {
            zone,
            total_score,
            temperature_score: temperature_score.clamp(0.0, TEMPERATURE_MAX),
            alert_score: alert_score.clamp(0.0, ALERT_MAX),
            data_quality_score,
            efficiency_score: efficiency_score.clamp(0.0, EFFICIENCY_MAX),
            temp_compliance_pct: compliance * 100.0,
            alert_rate_pct,
            temp_stability: stats.std_dev,
            data_freshness_minutes: age_minutes,
            window_len: window.len(),
        })
    }
}

impl Default for PerformanceScorer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Reject readings that belong to another zone
pub(super) fn check_zone(zone: ZoneId, readings: &[ClassifiedReading]) -> Result<()> {
    match readings.iter().find(|c| c.reading.zone != zone) {
        Some(other) => Err(MonitorError::InvalidConfig(format!(
            "{} reading at {} passed for {}",
            other.reading.zone, other.reading.timestamp, zone
        ))),
        None => Ok(()),
    }
}

fn check_monotonic(zone: ZoneId, window: &[ClassifiedReading]) -> Result<()> {
    for (i, pair) in window.windows(2).enumerate() {
        let (previous, current) = (pair[0].reading.timestamp, pair[1].reading.timestamp);
        if current < previous {
            return Err(MonitorError::NonMonotonicStream {
                zone,
                index: i + 1,
                previous,
                timestamp: current,
            });
        }
    }
    Ok(())
}

fn stability_band(std_dev: f64) -> f64 {
    if std_dev <= 0.5 {
        40.0
    } else if std_dev <= 1.0 {
        35.0
    } else if std_dev <= 2.0 {
        25.0
    } else {
        15.0
    }
}

fn alert_rate_score(rate_pct: f64) -> f64 {
    if rate_pct == 0.0 {
        30.0
    } else if rate_pct <= 5.0 {
        25.0
    } else if rate_pct <= 15.0 {
        15.0
    } else if rate_pct <= 30.0 {
        8.0
    } else {
        2.0
    }
}

fn freshness_bonus(age_minutes: f64) -> f64 {
    if age_minutes <= 5.0 {
        10.0
    } else if age_minutes <= 30.0 {
        7.0
    } else if age_minutes <= 60.0 {
        4.0
    } else {
        1.0
    }
}

fn variance_score(variance: f64) -> f64 {
    if variance <= 1.0 {
        10.0
    } else if variance <= 4.0 {
        7.0
    } else if variance <= 9.0 {
        4.0
    } else {
        1.0
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
