//! Warehouse zones and their per-zone parameters
//!
//! Every zone-specific number (bands, safety clamps, cost coefficients, labels)
//! lives in one [`ZoneProfile`] table so the rest of the crate can stay
//! parameterized by [`ZoneId`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AlertSensitivity;
use crate::error::MonitorError;

/// One of the four monitored storage areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZoneId {
    Freezer,
    Chiller,
    Produce,
    Pharma,
}

impl ZoneId {
    /// All zones in dashboard order
    pub const ALL: [ZoneId; 4] = [
        ZoneId::Freezer,
        ZoneId::Chiller,
        ZoneId::Produce,
        ZoneId::Pharma,
    ];

    /// Stream identifier, e.g. `Z1-Freezer`
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneId::Freezer => "Z1-Freezer",
            ZoneId::Chiller => "Z2-Chiller",
            ZoneId::Produce => "Z3-Produce",
            ZoneId::Pharma => "Z4-Pharma",
        }
    }

    /// Static parameters for this zone
    pub fn profile(&self) -> &'static ZoneProfile {
        match self {
            ZoneId::Freezer => &FREEZER,
            ZoneId::Chiller => &CHILLER,
            ZoneId::Produce => &PRODUCE,
            ZoneId::Pharma => &PHARMA,
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneId {
    type Err = MonitorError;

    /// Accepts the stream id (`Z1-Freezer`) or the bare zone name (`freezer`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ZoneId::ALL
            .into_iter()
            .find(|zone| {
                zone.as_str().eq_ignore_ascii_case(trimmed)
                    || zone.profile().name.eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| MonitorError::UnknownZone(trimmed.to_string()))
    }
}

impl TryFrom<String> for ZoneId {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ZoneId> for String {
    fn from(zone: ZoneId) -> Self {
        zone.as_str().to_string()
    }
}

/// Per-zone defaults and coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneProfile {
    /// Short name, e.g. `Freezer`
    pub name: &'static str,
    /// What the zone stores
    pub description: &'static str,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    pub warning_buffer: f64,
    pub alert_sensitivity: AlertSensitivity,
    pub data_quality_threshold: f64,
    /// Hard bounds the generator clamps temperature to
    pub safety_min: f64,
    pub safety_max: f64,
    /// Modeled product loss in dollars per alert
    pub loss_per_alert: f64,
}

impl ZoneProfile {
    /// Target temperature used for energy-waste estimates
    pub fn optimal_temperature(&self) -> f64 {
        (self.temp_min + self.temp_max) / 2.0
    }

    /// Target humidity
    pub fn optimal_humidity(&self) -> f64 {
        (self.humidity_min + self.humidity_max) / 2.0
    }

    /// Human-readable temperature band as written to the stream file
    pub fn temp_threshold_label(&self) -> String {
        format!("{} to {} °C", self.temp_min, self.temp_max)
    }

    /// Human-readable humidity band as written to the stream file
    pub fn humidity_threshold_label(&self) -> String {
        format!("{} to {}%", self.humidity_min, self.humidity_max)
    }
}

static FREEZER: ZoneProfile = ZoneProfile {
    name: "Freezer",
    description: "Frozen goods storage",
    temp_min: -22.0,
    temp_max: -18.0,
    humidity_min: 50.0,
    humidity_max: 70.0,
    warning_buffer: 2.0,
    alert_sensitivity: AlertSensitivity::Medium,
    data_quality_threshold: 95.0,
    safety_min: -35.0,
    safety_max: -10.0,
    loss_per_alert: 150.0,
};

static CHILLER: ZoneProfile = ZoneProfile {
    name: "Chiller",
    description: "Chilled goods storage",
    temp_min: 2.0,
    temp_max: 5.0,
    humidity_min: 70.0,
    humidity_max: 80.0,
    warning_buffer: 1.5,
    alert_sensitivity: AlertSensitivity::Medium,
    data_quality_threshold: 95.0,
    safety_min: -10.0,
    safety_max: 25.0,
    loss_per_alert: 75.0,
};

static PRODUCE: ZoneProfile = ZoneProfile {
    name: "Produce",
    description: "Fresh produce storage",
    temp_min: 5.0,
    temp_max: 10.0,
    humidity_min: 80.0,
    humidity_max: 95.0,
    warning_buffer: 2.0,
    alert_sensitivity: AlertSensitivity::High,
    data_quality_threshold: 98.0,
    safety_min: -10.0,
    safety_max: 25.0,
    loss_per_alert: 200.0,
};

static PHARMA: ZoneProfile = ZoneProfile {
    name: "Pharma",
    description: "Pharmaceutical storage",
    temp_min: 2.0,
    temp_max: 8.0,
    humidity_min: 50.0,
    humidity_max: 60.0,
    warning_buffer: 1.0,
    alert_sensitivity: AlertSensitivity::Critical,
    data_quality_threshold: 99.0,
    safety_min: -10.0,
    safety_max: 25.0,
    loss_per_alert: 2500.0,
};
