//! Configuration management for the CLI

use anyhow::{Context, Result};
use monitor_lib::{config::ThresholdOverrides, summary::Analyzer, ThresholdConfig, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration
///
/// ```json
/// { "thresholds": { "Z4-Pharma": { "temp_max": 7.5, "alert_sensitivity": "High" } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Per-zone partial threshold overrides
    #[serde(default)]
    pub thresholds: BTreeMap<ZoneId, ThresholdOverrides>,
}

impl Config {
    /// Load configuration from an explicit path, or the default location
    ///
    /// An explicit path must exist; a missing default file means no overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        debug!(path = %config_path.display(), "Loading threshold overrides");
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Analyzer with every override applied to its zone's defaults
    pub fn analyzer(&self) -> Result<Analyzer> {
        self.thresholds
            .iter()
            .try_fold(Analyzer::new(), |analyzer, (zone, overrides)| {
                let config = ThresholdConfig::for_zone(*zone)
                    .apply(overrides)
                    .with_context(|| format!("Invalid threshold override for {}", zone))?;
                Ok(analyzer.with_threshold(*zone, config))
            })
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("coldstore").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_lib::AlertSensitivity;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_overrides_applied_to_zone_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"thresholds": {"Z4-Pharma": {"temp_max": 7.5, "alert_sensitivity": "Low"}}}"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let analyzer = config.analyzer().unwrap();

        let pharma = analyzer.threshold(ZoneId::Pharma);
        assert_eq!(pharma.temp_min(), 2.0);
        assert_eq!(pharma.temp_max(), 7.5);
        assert_eq!(pharma.alert_sensitivity(), AlertSensitivity::Low);
        assert_eq!(
            analyzer.threshold(ZoneId::Freezer),
            ThresholdConfig::for_zone(ZoneId::Freezer)
        );
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"thresholds": {"Z2-Chiller": {"temp_min": 9.0}}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.analyzer().is_err());
    }

    #[test]
    fn test_unknown_zone_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"thresholds": {"Z9-Attic": {}}}"#).unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.json"))).is_err());
    }
}
