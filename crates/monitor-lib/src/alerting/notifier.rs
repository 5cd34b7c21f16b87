//! Alert notifications with deduplication
//!
//! Handles:
//! - Turning alert-flagged readings into operator-facing notifications
//! - Suppressing repeats of the same zone, severity and side within a window
//!
//! The dedup window is measured on reading timestamps, so replaying a stream
//! produces the same notifications as watching it live.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{ClassifiedReading, Severity};
use crate::config::ThresholdConfig;
use crate::zones::ZoneId;

/// Default deduplication window (15 minutes)
const DEFAULT_DEDUP_WINDOW_MINUTES: i64 = 15;

/// Which side of the band a reading left through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Excursion {
    Low,
    High,
}

/// Operator-facing alert notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub zone: ZoneId,
    pub severity: Severity,
    pub excursion: Excursion,
    pub temperature: f64,
    pub timestamp: NaiveDateTime,
    pub message: String,
}

/// Key for deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DedupKey {
    zone: ZoneId,
    severity: Severity,
    excursion: Excursion,
}

/// Alert notifier with deduplication
pub struct AlertNotifier {
    dedup_window: Duration,
    /// key -> timestamp of the last notification
    recent: RwLock<HashMap<DedupKey, NaiveDateTime>>,
}

impl AlertNotifier {
    /// Create a notifier with the default 15-minute deduplication window
    pub fn new() -> Self {
        Self {
            dedup_window: Duration::minutes(DEFAULT_DEDUP_WINDOW_MINUTES),
            recent: RwLock::new(HashMap::new()),
        }
    }

    /// Set custom deduplication window
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// Build a notification for an alert-flagged reading, unless suppressed
    pub fn notify(
        &self,
        classified: &ClassifiedReading,
        config: &ThresholdConfig,
    ) -> Option<AlertNotification> {
        if !classified.alert_flag {
            return None;
        }

        let reading = &classified.reading;
        let excursion = if reading.temperature < config.temp_min() {
            Excursion::Low
        } else {
            Excursion::High
        };
        let key = DedupKey {
            zone: reading.zone,
            severity: classified.severity,
            excursion,
        };
        if self.should_suppress(&key, reading.timestamp) {
            return None;
        }

        let message = match (classified.severity, excursion) {
            (Severity::Critical, Excursion::Low) => {
                format!("Temperature critically low: {:.1}°C", reading.temperature)
            }
            (Severity::Critical, Excursion::High) => {
                format!("Temperature critically high: {:.1}°C", reading.temperature)
            }
            _ => format!("Temperature out of range: {:.1}°C", reading.temperature),
        };

        self.record(key, reading.timestamp);

        Some(AlertNotification {
            zone: reading.zone,
            severity: classified.severity,
            excursion,
            temperature: reading.temperature,
            timestamp: reading.timestamp,
            message,
        })
    }

    /// Notifications for a whole classified stream, in order
    pub fn notify_all(
        &self,
        classified: &[ClassifiedReading],
        config: &ThresholdConfig,
    ) -> Vec<AlertNotification> {
        classified
            .iter()
            .filter_map(|c| self.notify(c, config))
            .collect()
    }

    fn should_suppress(&self, key: &DedupKey, at: NaiveDateTime) -> bool {
        let recent = self.recent.read().unwrap_or_else(|e| e.into_inner());
        recent
            .get(key)
            .is_some_and(|last| at >= *last && at - *last < self.dedup_window)
    }

    fn record(&self, key: DedupKey, at: NaiveDateTime) {
        let mut recent = self.recent.write().unwrap_or_else(|e| e.into_inner());
        recent.insert(key, at);

        // Clean up old entries
        let window = self.dedup_window;
        recent.retain(|_, last| at - *last < window);
    }
}

impl Default for AlertNotifier {
    fn default() -> Self {
        Self::new()
    }
}
