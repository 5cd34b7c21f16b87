//! Generator configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Stream file readings are appended to
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Seconds between batches
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Chance per value of a simulated equipment fault
    #[serde(default = "default_violation_probability")]
    pub violation_probability: f64,

    /// Fixed seed for a replayable stream
    #[serde(default)]
    pub seed: Option<u64>,

    /// Site name attached to structured log events
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

fn default_output_path() -> String {
    "simulated_warehouse_data_30min_demo.csv".to_string()
}

fn default_interval() -> u64 {
    10
}

fn default_api_port() -> u16 {
    8080
}

fn default_violation_probability() -> f64 {
    0.08
}

fn default_site_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "warehouse".to_string())
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            interval_secs: default_interval(),
            api_port: default_api_port(),
            violation_probability: default_violation_probability(),
            seed: None,
            site_name: default_site_name(),
        }
    }
}

impl GeneratorConfig {
    /// Load from `generator.toml` (optional) and `GENERATOR_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("generator.toml"))
    }

    /// Load from the given file (optional) with environment overrides
    pub fn load_from(file: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix("GENERATOR"))
            .build()
            .context("Failed to read generator configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid generator configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            anyhow::bail!("interval_secs must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.violation_probability) {
            anyhow::bail!(
                "violation_probability {} outside [0, 1]",
                self.violation_probability
            );
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
