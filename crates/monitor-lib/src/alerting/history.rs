//! Alert history over a classified stream

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::{ClassifiedReading, Severity};

/// Number of alert events kept for listings
const RECENT_EVENT_LIMIT: usize = 10;

/// Lookback for the "recent" counter
const RECENT_WINDOW_HOURS: i64 = 24;

/// One alert row for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub severity: Severity,
    pub label: String,
}

/// Aggregated alert statistics for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertHistory {
    pub total_alerts: usize,
    /// Alerts within the trailing 24 hours of the evaluation instant
    pub recent_alerts: usize,
    pub critical_alerts: usize,
    /// Alerts per reading, in percent
    pub alert_rate_pct: f64,
    /// Latest alert events, oldest first
    pub recent_events: Vec<AlertEvent>,
}

impl AlertHistory {
    pub fn from_stream(classified: &[ClassifiedReading], now: NaiveDateTime) -> Self {
        let alerts: Vec<&ClassifiedReading> = classified.iter().filter(|c| c.alert_flag).collect();
        let cutoff = now - Duration::hours(RECENT_WINDOW_HOURS);

        let alert_rate_pct = if classified.is_empty() {
            0.0
        } else {
            alerts.len() as f64 / classified.len() as f64 * 100.0
        };

        let recent_events = alerts
            .iter()
            .skip(alerts.len().saturating_sub(RECENT_EVENT_LIMIT))
            .map(|c| AlertEvent {
                timestamp: c.reading.timestamp,
                temperature: c.reading.temperature,
                humidity: c.reading.humidity,
                severity: c.severity,
                label: c.severity.event_label().to_string(),
            })
            .collect();

        Self {
            total_alerts: alerts.len(),
            recent_alerts: alerts
                .iter()
                .filter(|c| c.reading.timestamp >= cutoff && c.reading.timestamp <= now)
                .count(),
            critical_alerts: alerts
                .iter()
                .filter(|c| c.severity == Severity::Critical)
                .count(),
            alert_rate_pct,
            recent_events,
        }
    }
}

/// Alert counts bucketed by hour
pub fn hourly_alert_counts(classified: &[ClassifiedReading]) -> BTreeMap<NaiveDateTime, usize> {
    let mut buckets = BTreeMap::new();
    for c in classified.iter().filter(|c| c.alert_flag) {
        let ts = c.reading.timestamp;
        let hour = ts
            .date()
            .and_hms_opt(ts.hour(), 0, 0)
            .unwrap_or(ts);
        *buckets.entry(hour).or_insert(0) += 1;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::classify_all;
    use crate::config::{AlertSensitivity, ThresholdConfig};
    use crate::models::fixtures::{base_time, series};
    use crate::zones::ZoneId;

    fn stream(temps: &[f64]) -> Vec<ClassifiedReading> {
        let config =
            ThresholdConfig::for_zone(ZoneId::Freezer).with_sensitivity(AlertSensitivity::Medium);
        classify_all(&series(ZoneId::Freezer, temps), &config).unwrap()
    }

    #[test]
    fn test_empty_stream_has_no_alerts() {
        let history = AlertHistory::from_stream(&[], base_time());
        assert_eq!(history.total_alerts, 0);
        assert_eq!(history.alert_rate_pct, 0.0);
        assert!(history.recent_events.is_empty());
    }

    #[test]
    fn test_counts_and_labels() {
        // normal, warning (not flagged at Medium), alert, critical
        let classified = stream(&[-20.0, -23.0, -25.0, -30.0]);
        let history = AlertHistory::from_stream(&classified, base_time() + Duration::hours(1));

        assert_eq!(history.total_alerts, 2);
        assert_eq!(history.critical_alerts, 1);
        assert_eq!(history.recent_alerts, 2);
        assert!((history.alert_rate_pct - 50.0).abs() < 1e-9);
        let labels: Vec<&str> = history.recent_events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["HIGH", "CRITICAL"]);
    }

    #[test]
    fn test_recent_window_excludes_old_alerts() {
        let classified = stream(&[-30.0, -30.0]);
        let history = AlertHistory::from_stream(&classified, base_time() + Duration::days(2));
        assert_eq!(history.total_alerts, 2);
        assert_eq!(history.recent_alerts, 0);
    }

    #[test]
    fn test_recent_events_capped() {
        let temps = vec![-30.0; 25];
        let history = AlertHistory::from_stream(&stream(&temps), base_time());
        assert_eq!(history.recent_events.len(), RECENT_EVENT_LIMIT);
        assert_eq!(
            history.recent_events.last().map(|e| e.timestamp),
            Some(base_time() + Duration::minutes(24))
        );
    }

    #[test]
    fn test_hourly_buckets() {
        let temps = vec![-30.0; 90];
        let buckets = hourly_alert_counts(&stream(&temps));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.values().sum::<usize>(), 90);
        assert_eq!(buckets.get(&base_time()), Some(&60));
    }
}
