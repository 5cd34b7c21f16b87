//! Temperature trend forecasting
//!
//! Fits a least-squares line to a zone's recent temperatures (x = reading
//! index) and projects it forward to estimate the risk of leaving the band.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::models::Reading;
use crate::zones::ZoneId;

/// Minimum readings required for a forecast
const MIN_READINGS_FOR_FORECAST: usize = 10;

/// Readings considered for the fit
const DEFAULT_LOOKBACK: usize = 100;

/// Projected readings
const PROJECTION_STEPS: usize = 12;

/// Projected readings that feed the risk estimate
const RISK_HORIZON: usize = 6;

/// Slope in degrees per reading beyond which sensors need a calibration check
const CALIBRATION_SLOPE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_pct(risk_pct: f64) -> Self {
        if risk_pct > 50.0 {
            RiskLevel::High
        } else if risk_pct > 20.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Projected trend for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub zone: ZoneId,
    pub current_temperature: f64,
    /// Degrees per reading
    pub slope: f64,
    pub projected: Vec<f64>,
    pub risk_pct: f64,
    pub risk_level: RiskLevel,
    pub readings_analyzed: usize,
}

/// Maintenance follow-up derived from a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MaintenanceAction {
    /// High risk of leaving the band
    ScheduleInspection,
    /// Medium risk of leaving the band
    PreventiveMaintenance,
    /// Steep trend, regardless of risk
    CheckCalibration { slope: f64 },
}

impl fmt::Display for MaintenanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceAction::ScheduleInspection => {
                write!(f, "High risk detected, schedule immediate inspection")
            }
            MaintenanceAction::PreventiveMaintenance => {
                write!(f, "Medium risk, monitor closely and schedule preventive maintenance")
            }
            MaintenanceAction::CheckCalibration { slope } => write!(
                f,
                "Significant temperature trend ({:+.3}°C/reading), check system calibration",
                slope
            ),
        }
    }
}

impl TrendForecast {
    /// Follow-ups for this zone, most urgent first
    pub fn maintenance(&self) -> Vec<MaintenanceAction> {
        let mut actions = Vec::new();
        match self.risk_level {
            RiskLevel::High => actions.push(MaintenanceAction::ScheduleInspection),
            RiskLevel::Medium => actions.push(MaintenanceAction::PreventiveMaintenance),
            RiskLevel::Low => {}
        }
        if self.slope.abs() > CALIBRATION_SLOPE {
            actions.push(MaintenanceAction::CheckCalibration { slope: self.slope });
        }
        actions
    }
}

/// Linear trend forecaster
pub struct TrendForecaster {
    pub lookback: usize,
}

impl TrendForecaster {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    /// Forecast from a zone's readings in stream order
    ///
    /// Returns `None` when fewer than ten usable readings are available.
    pub fn forecast(
        &self,
        zone: ZoneId,
        readings: &[Reading],
        config: &ThresholdConfig,
    ) -> Option<TrendForecast> {
        let start = readings.len().saturating_sub(self.lookback);
        let temps: Vec<f64> = readings[start..]
            .iter()
            .map(|r| r.temperature)
            .filter(|t| t.is_finite())
            .collect();
        if temps.len() < MIN_READINGS_FOR_FORECAST {
            return None;
        }

        let slope = linear_regression_slope(&temps);
        let current_temperature = *temps.last()?;
        let projected: Vec<f64> = (1..=PROJECTION_STEPS)
            .map(|i| current_temperature + slope * i as f64)
            .collect();

        let outside = projected
            .iter()
            .take(RISK_HORIZON)
            .filter(|t| !config.temperature_in_band(**t))
            .count();
        let risk_pct = outside as f64 / RISK_HORIZON as f64 * 100.0;

        Some(TrendForecast {
            zone,
            current_temperature,
            slope,
            projected,
            risk_pct,
            risk_level: RiskLevel::from_pct(risk_pct),
            readings_analyzed: temps.len(),
        })
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

/// Least-squares slope with x = 0, 1, 2, ...
fn linear_regression_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}
