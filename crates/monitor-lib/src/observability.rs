//! Observability for the cold-storage monitor
//!
//! Provides:
//! - Prometheus metrics (generation latency, per-zone reading and alert counts)
//! - Structured logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::alerting::{AlertNotification, Severity};
use crate::scoring::ZoneScore;
use crate::zones::ZoneId;

/// Histogram buckets for generation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    generation_latency_seconds: Histogram,
    readings_generated: IntCounterVec,
    readings_out_of_band: IntCounterVec,
    alerts_raised: IntCounterVec,
    stream_write_errors: IntCounter,
    last_temperature: GaugeVec,
    zones_monitored: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            generation_latency_seconds: register_histogram!(
                "coldstore_generation_latency_seconds",
                "Time spent generating and persisting one batch of readings",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register generation_latency_seconds"),

            readings_generated: register_int_counter_vec!(
                "coldstore_readings_generated_total",
                "Readings generated per zone",
                &["zone"]
            )
            .expect("Failed to register readings_generated"),

            readings_out_of_band: register_int_counter_vec!(
                "coldstore_readings_out_of_band_total",
                "Readings outside the zone's optimal temperature band",
                &["zone"]
            )
            .expect("Failed to register readings_out_of_band"),

            alerts_raised: register_int_counter_vec!(
                "coldstore_alerts_raised_total",
                "Alert notifications raised per zone and severity",
                &["zone", "severity"]
            )
            .expect("Failed to register alerts_raised"),

            stream_write_errors: register_int_counter!(
                "coldstore_stream_write_errors_total",
                "Failed appends to the stream file"
            )
            .expect("Failed to register stream_write_errors"),

            last_temperature: register_gauge_vec!(
                "coldstore_last_temperature_celsius",
                "Most recent temperature per zone",
                &["zone"]
            )
            .expect("Failed to register last_temperature"),

            zones_monitored: register_int_gauge!(
                "coldstore_zones_monitored",
                "Number of zones being generated"
            )
            .expect("Failed to register zones_monitored"),
        }
    }
}

/// Handle to the global metrics instance
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a handle, registering the metrics on first call
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn observe_generation_latency(&self, duration_secs: f64) {
        self.inner().generation_latency_seconds.observe(duration_secs);
    }

    /// Count a generated reading and track its temperature
    pub fn record_reading(&self, zone: ZoneId, temperature: f64, in_band: bool) {
        let inner = self.inner();
        inner
            .readings_generated
            .with_label_values(&[zone.as_str()])
            .inc();
        if !in_band {
            inner
                .readings_out_of_band
                .with_label_values(&[zone.as_str()])
                .inc();
        }
        inner
            .last_temperature
            .with_label_values(&[zone.as_str()])
            .set(temperature);
    }

    pub fn inc_alerts_raised(&self, zone: ZoneId, severity: Severity) {
        let severity = severity.to_string();
        self.inner()
            .alerts_raised
            .with_label_values(&[zone.as_str(), severity.as_str()])
            .inc();
    }

    pub fn inc_stream_write_errors(&self) {
        self.inner().stream_write_errors.inc();
    }

    pub fn set_zones_monitored(&self, count: i64) {
        self.inner().zones_monitored.set(count);
    }
}

/// Structured logger for monitor events
///
/// Every event carries a stable `event` field and the emitting site.
#[derive(Clone)]
pub struct StructuredLogger {
    site: String,
}

impl StructuredLogger {
    pub fn new(site: impl Into<String>) -> Self {
        Self { site: site.into() }
    }

    pub fn log_startup(&self, version: &str, output_path: &str, interval_secs: u64) {
        info!(
            event = "generator_started",
            site = %self.site,
            version = %version,
            output_path = %output_path,
            interval_secs = interval_secs,
            "Reading generator started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "generator_shutdown",
            site = %self.site,
            reason = %reason,
            "Reading generator shutting down"
        );
    }

    pub fn log_batch(&self, readings: usize, out_of_band: usize, duration_ms: u64) {
        debug!(
            event = "readings_generated",
            site = %self.site,
            readings = readings,
            out_of_band = out_of_band,
            duration_ms = duration_ms,
            "Generated reading batch"
        );
    }

    pub fn log_out_of_band(&self, zone: ZoneId, temperature: f64, severity: Severity) {
        debug!(
            event = "reading_out_of_band",
            site = %self.site,
            zone = %zone,
            temperature = temperature,
            severity = %severity,
            "Reading outside optimal band"
        );
    }

    pub fn log_alert(&self, notification: &AlertNotification) {
        match notification.severity {
            Severity::Critical => {
                warn!(
                    event = "alert_raised",
                    site = %self.site,
                    zone = %notification.zone,
                    severity = %notification.severity,
                    temperature = notification.temperature,
                    timestamp = %notification.timestamp,
                    "{}",
                    notification.message
                );
            }
            _ => {
                info!(
                    event = "alert_raised",
                    site = %self.site,
                    zone = %notification.zone,
                    severity = %notification.severity,
                    temperature = notification.temperature,
                    timestamp = %notification.timestamp,
                    "{}",
                    notification.message
                );
            }
        }
    }

    pub fn log_write_failure(&self, path: &str, error: &str) {
        warn!(
            event = "stream_write_failed",
            site = %self.site,
            path = %path,
            error = %error,
            "Failed to append readings to stream file"
        );
    }

    pub fn log_zone_score(&self, score: &ZoneScore) {
        info!(
            event = "zone_scored",
            site = %self.site,
            zone = %score.zone,
            total_score = score.total_score,
            band = %score.band(),
            temp_compliance_pct = score.temp_compliance_pct,
            alert_rate_pct = score.alert_rate_pct,
            "Zone performance scored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_can_be_recorded() {
        let metrics = MonitorMetrics::new();
        metrics.observe_generation_latency(0.001);
        metrics.record_reading(ZoneId::Freezer, -20.0, true);
        metrics.record_reading(ZoneId::Pharma, 9.5, false);
        metrics.inc_alerts_raised(ZoneId::Pharma, Severity::Warning);
        metrics.inc_stream_write_errors();
        metrics.set_zones_monitored(4);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "coldstore_readings_out_of_band_total"));
    }

    #[test]
    fn test_handles_share_registration() {
        let a = MonitorMetrics::new();
        let b = a.clone();
        a.set_zones_monitored(2);
        b.set_zones_monitored(4);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("warehouse-a");
        assert_eq!(logger.site, "warehouse-a");
    }
}
