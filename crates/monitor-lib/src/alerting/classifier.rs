//! Severity classification of temperature readings
//!
//! Severity is measured by distance from the optimal band in units of the
//! warning buffer. The alert sensitivity then decides which tiers count as an
//! alert. Humidity is carried along but does not influence the tier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{AlertSensitivity, ThresholdConfig};
use crate::error::{MonitorError, Result};
use crate::models::Reading;

/// Ordered severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Alert,
    Critical,
}

impl Severity {
    /// Label used in alert event listings
    pub fn event_label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Alert => "HIGH",
            Severity::Warning => "MEDIUM",
            Severity::Normal => "NONE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Normal => write!(f, "normal"),
            Severity::Warning => write!(f, "warning"),
            Severity::Alert => write!(f, "alert"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl AlertSensitivity {
    /// Lowest tier that raises an alert at this sensitivity
    ///
    /// High and Critical share the same trigger set.
    pub fn minimum_alert_tier(&self) -> Severity {
        match self {
            AlertSensitivity::Low => Severity::Critical,
            AlertSensitivity::Medium => Severity::Alert,
            AlertSensitivity::High | AlertSensitivity::Critical => Severity::Warning,
        }
    }

    /// Whether a tier counts as an alert
    pub fn triggers(&self, severity: Severity) -> bool {
        severity >= self.minimum_alert_tier()
    }
}

/// A reading plus its derived classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReading {
    pub reading: Reading,
    pub severity: Severity,
    pub alert_flag: bool,
    /// Informational only; absent when humidity was not recorded
    pub humidity_in_band: Option<bool>,
}

/// Severity tier of a temperature against the configured band
pub fn severity_for(temperature: f64, config: &ThresholdConfig) -> Severity {
    let buffer = config.warning_buffer();
    let (min, max) = (config.temp_min(), config.temp_max());

    if temperature < min - 2.0 * buffer || temperature > max + 2.0 * buffer {
        Severity::Critical
    } else if temperature < min - buffer || temperature > max + buffer {
        Severity::Alert
    } else if temperature < min || temperature > max {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Classify a single reading
///
/// Rejects invalid configurations and readings without a usable temperature.
pub fn classify(reading: &Reading, config: &ThresholdConfig) -> Result<ClassifiedReading> {
    config.validate()?;
    if !reading.temperature.is_finite() {
        return Err(MonitorError::MissingField {
            field: "temperature",
        });
    }

    let severity = severity_for(reading.temperature, config);
    let humidity_in_band = reading
        .humidity
        .filter(|h| h.is_finite())
        .map(|h| config.humidity_in_band(h));

    Ok(ClassifiedReading {
        reading: reading.clone(),
        severity,
        alert_flag: config.alert_sensitivity().triggers(severity),
        humidity_in_band,
    })
}

/// Classify a zone's readings in order, failing on the first bad reading
pub fn classify_all(readings: &[Reading], config: &ThresholdConfig) -> Result<Vec<ClassifiedReading>> {
    config.validate()?;
    readings.iter().map(|r| classify(r, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::base_time;
    use crate::zones::ZoneId;

    fn freezer_config(sensitivity: AlertSensitivity) -> ThresholdConfig {
        ThresholdConfig::new(-22.0, -18.0, 2.0, 50.0, 70.0, sensitivity, 95.0).unwrap()
    }

    fn reading(temp: f64) -> Reading {
        Reading::new(ZoneId::Freezer, base_time(), temp, Some(60.0))
    }

    #[test]
    fn test_slightly_above_band_is_warning() {
        let low = classify(&reading(-17.0), &freezer_config(AlertSensitivity::Low)).unwrap();
        assert_eq!(low.severity, Severity::Warning);
        assert!(!low.alert_flag);

        let high = classify(&reading(-17.0), &freezer_config(AlertSensitivity::High)).unwrap();
        assert_eq!(high.severity, Severity::Warning);
        assert!(high.alert_flag);
    }

    #[test]
    fn test_far_above_band_is_critical_under_every_sensitivity() {
        for sensitivity in AlertSensitivity::ALL {
            let c = classify(&reading(-12.0), &freezer_config(sensitivity)).unwrap();
            assert_eq!(c.severity, Severity::Critical);
            assert!(c.alert_flag, "{sensitivity}");
        }
    }

    #[test]
    fn test_tier_boundaries() {
        let config = freezer_config(AlertSensitivity::Medium);
        assert_eq!(severity_for(-22.0, &config), Severity::Normal);
        assert_eq!(severity_for(-18.0, &config), Severity::Normal);
        assert_eq!(severity_for(-22.5, &config), Severity::Warning);
        assert_eq!(severity_for(-24.0, &config), Severity::Warning);
        assert_eq!(severity_for(-24.5, &config), Severity::Alert);
        assert_eq!(severity_for(-26.0, &config), Severity::Alert);
        assert_eq!(severity_for(-26.1, &config), Severity::Critical);
        assert_eq!(severity_for(-15.5, &config), Severity::Alert);
    }

    #[test]
    fn test_severity_monotone_in_distance() {
        let config = freezer_config(AlertSensitivity::Medium);
        let mut previous = Severity::Normal;
        for step in 0..200 {
            let temp = -18.0 + step as f64 * 0.05;
            let s = severity_for(temp, &config);
            assert!(s >= previous, "tier dropped at {temp}");
            previous = s;
        }
        let mut previous = Severity::Normal;
        for step in 0..200 {
            let temp = -22.0 - step as f64 * 0.05;
            let s = severity_for(temp, &config);
            assert!(s >= previous, "tier dropped at {temp}");
            previous = s;
        }
    }

    #[test]
    fn test_sensitivity_alert_sets_are_nested() {
        let tiers = [
            Severity::Normal,
            Severity::Warning,
            Severity::Alert,
            Severity::Critical,
        ];
        for tier in tiers {
            let flags: Vec<bool> = AlertSensitivity::ALL.iter().map(|s| s.triggers(tier)).collect();
            for pair in flags.windows(2) {
                assert!(!pair[0] || pair[1], "{tier} broke nesting: {flags:?}");
            }
        }
        assert!(!AlertSensitivity::Critical.triggers(Severity::Normal));
    }

    #[test]
    fn test_high_and_critical_sensitivity_match() {
        assert_eq!(
            AlertSensitivity::High.minimum_alert_tier(),
            AlertSensitivity::Critical.minimum_alert_tier()
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let config = freezer_config(AlertSensitivity::Medium);
        let r = reading(-24.7);
        assert_eq!(classify(&r, &config).unwrap(), classify(&r, &config).unwrap());
    }

    #[test]
    fn test_humidity_never_changes_tier() {
        let config = freezer_config(AlertSensitivity::High);
        let mut dry = reading(-20.0);
        dry.humidity = Some(5.0);
        let c = classify(&dry, &config).unwrap();
        assert_eq!(c.severity, Severity::Normal);
        assert!(!c.alert_flag);
        assert_eq!(c.humidity_in_band, Some(false));
    }

    #[test]
    fn test_missing_humidity_is_tolerated() {
        let mut r = reading(-20.0);
        r.humidity = None;
        let c = classify(&r, &freezer_config(AlertSensitivity::Low)).unwrap();
        assert_eq!(c.humidity_in_band, None);
    }

    #[test]
    fn test_non_finite_temperature_rejected() {
        let err = classify(&reading(f64::NAN), &freezer_config(AlertSensitivity::Low)).unwrap_err();
        assert_eq!(
            err,
            MonitorError::MissingField {
                field: "temperature"
            }
        );
    }

    #[test]
    fn test_zero_buffer_collapses_tiers_outside_band() {
        let config =
            ThresholdConfig::new(2.0, 5.0, 0.0, 70.0, 80.0, AlertSensitivity::Low, 95.0).unwrap();
        assert_eq!(severity_for(5.01, &config), Severity::Critical);
        assert_eq!(severity_for(5.0, &config), Severity::Normal);
    }

    #[test]
    fn test_classify_all_keeps_order() {
        let config = freezer_config(AlertSensitivity::Medium);
        let readings = vec![reading(-20.0), reading(-25.0), reading(-30.0)];
        let classified = classify_all(&readings, &config).unwrap();
        let tiers: Vec<Severity> = classified.iter().map(|c| c.severity).collect();
        assert_eq!(tiers, vec![Severity::Normal, Severity::Alert, Severity::Critical]);
    }
}
