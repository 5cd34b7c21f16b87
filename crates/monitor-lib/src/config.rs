//! Threshold configuration for a zone
//!
//! A [`ThresholdConfig`] can only be obtained through validation, whether it is
//! built in code, derived from a zone profile, or deserialized from an override
//! file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::zones::ZoneId;

/// How eagerly severity tiers count as alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSensitivity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSensitivity {
    pub const ALL: [AlertSensitivity; 4] = [
        AlertSensitivity::Low,
        AlertSensitivity::Medium,
        AlertSensitivity::High,
        AlertSensitivity::Critical,
    ];
}

impl fmt::Display for AlertSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSensitivity::Low => write!(f, "Low"),
            AlertSensitivity::Medium => write!(f, "Medium"),
            AlertSensitivity::High => write!(f, "High"),
            AlertSensitivity::Critical => write!(f, "Critical"),
        }
    }
}

impl FromStr for AlertSensitivity {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        AlertSensitivity::ALL
            .into_iter()
            .find(|level| level.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MonitorError::InvalidConfig(format!("unknown alert sensitivity `{s}`")))
    }
}

/// Validated per-zone thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds", into = "RawThresholds")]
pub struct ThresholdConfig {
    temp_min: f64,
    temp_max: f64,
    warning_buffer: f64,
    humidity_min: f64,
    humidity_max: f64,
    alert_sensitivity: AlertSensitivity,
    data_quality_threshold: f64,
}

impl ThresholdConfig {
    /// Build a configuration, rejecting inverted bands and out-of-range values
    pub fn new(
        temp_min: f64,
        temp_max: f64,
        warning_buffer: f64,
        humidity_min: f64,
        humidity_max: f64,
        alert_sensitivity: AlertSensitivity,
        data_quality_threshold: f64,
    ) -> Result<Self> {
        let config = Self {
            temp_min,
            temp_max,
            warning_buffer,
            humidity_min,
            humidity_max,
            alert_sensitivity,
            data_quality_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults from the zone profile table
    pub fn for_zone(zone: ZoneId) -> Self {
        let p = zone.profile();
        Self {
            temp_min: p.temp_min,
            temp_max: p.temp_max,
            warning_buffer: p.warning_buffer,
            humidity_min: p.humidity_min,
            humidity_max: p.humidity_max,
            alert_sensitivity: p.alert_sensitivity,
            data_quality_threshold: p.data_quality_threshold,
        }
    }

    /// Check the invariants every consumer relies on
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("temp_min", self.temp_min),
            ("temp_max", self.temp_max),
            ("warning_buffer", self.warning_buffer),
            ("humidity_min", self.humidity_min),
            ("humidity_max", self.humidity_max),
            ("data_quality_threshold", self.data_quality_threshold),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(MonitorError::InvalidConfig(format!("{name} must be finite")));
        }
        if self.temp_min > self.temp_max {
            return Err(MonitorError::InvalidConfig(format!(
                "temp_min ({}) exceeds temp_max ({})",
                self.temp_min, self.temp_max
            )));
        }
        if self.humidity_min > self.humidity_max {
            return Err(MonitorError::InvalidConfig(format!(
                "humidity_min ({}) exceeds humidity_max ({})",
                self.humidity_min, self.humidity_max
            )));
        }
        if self.warning_buffer < 0.0 {
            return Err(MonitorError::InvalidConfig(format!(
                "warning_buffer ({}) must not be negative",
                self.warning_buffer
            )));
        }
        if !(0.0..=100.0).contains(&self.data_quality_threshold) {
            return Err(MonitorError::InvalidConfig(format!(
                "data_quality_threshold ({}) must be within 0..=100",
                self.data_quality_threshold
            )));
        }
        Ok(())
    }

    /// Same thresholds with a different alert sensitivity
    pub fn with_sensitivity(mut self, sensitivity: AlertSensitivity) -> Self {
        self.alert_sensitivity = sensitivity;
        self
    }

    /// Apply a partial override, re-validating the result
    pub fn apply(&self, overrides: &ThresholdOverrides) -> Result<Self> {
        Self::new(
            overrides.temp_min.unwrap_or(self.temp_min),
            overrides.temp_max.unwrap_or(self.temp_max),
            overrides.warning_buffer.unwrap_or(self.warning_buffer),
            overrides.humidity_min.unwrap_or(self.humidity_min),
            overrides.humidity_max.unwrap_or(self.humidity_max),
            overrides.alert_sensitivity.unwrap_or(self.alert_sensitivity),
            overrides
                .data_quality_threshold
                .unwrap_or(self.data_quality_threshold),
        )
    }

    pub fn temp_min(&self) -> f64 {
        self.temp_min
    }

    pub fn temp_max(&self) -> f64 {
        self.temp_max
    }

    pub fn warning_buffer(&self) -> f64 {
        self.warning_buffer
    }

    pub fn humidity_min(&self) -> f64 {
        self.humidity_min
    }

    pub fn humidity_max(&self) -> f64 {
        self.humidity_max
    }

    pub fn alert_sensitivity(&self) -> AlertSensitivity {
        self.alert_sensitivity
    }

    pub fn data_quality_threshold(&self) -> f64 {
        self.data_quality_threshold
    }

    /// Whether a temperature sits inside the optimal band (inclusive)
    pub fn temperature_in_band(&self, temperature: f64) -> bool {
        (self.temp_min..=self.temp_max).contains(&temperature)
    }

    /// Whether a humidity sits inside the optimal band (inclusive)
    pub fn humidity_in_band(&self, humidity: f64) -> bool {
        (self.humidity_min..=self.humidity_max).contains(&humidity)
    }
}

/// Partial threshold override, as found in configuration files
///
/// Unset fields fall back to the zone defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_buffer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_sensitivity: Option<AlertSensitivity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality_threshold: Option<f64>,
}

/// Serialized shape of [`ThresholdConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawThresholds {
    temp_min: f64,
    temp_max: f64,
    warning_buffer: f64,
    humidity_min: f64,
    humidity_max: f64,
    alert_sensitivity: AlertSensitivity,
    data_quality_threshold: f64,
}

impl TryFrom<RawThresholds> for ThresholdConfig {
    type Error = MonitorError;

    fn try_from(raw: RawThresholds) -> Result<Self> {
        ThresholdConfig::new(
            raw.temp_min,
            raw.temp_max,
            raw.warning_buffer,
            raw.humidity_min,
            raw.humidity_max,
            raw.alert_sensitivity,
            raw.data_quality_threshold,
        )
    }
}

impl From<ThresholdConfig> for RawThresholds {
    fn from(c: ThresholdConfig) -> Self {
        Self {
            temp_min: c.temp_min,
            temp_max: c.temp_max,
            warning_buffer: c.warning_buffer,
            humidity_min: c.humidity_min,
            humidity_max: c.humidity_max,
            alert_sensitivity: c.alert_sensitivity,
            data_quality_threshold: c.data_quality_threshold,
        }
    }
}
