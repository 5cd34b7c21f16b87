//! Reading generation loop
//!
//! Produces one reading per zone on every tick, classifies each against the
//! zone defaults and appends the batch to the configured sink. Deduplicated
//! alert notifications follow once the batch is persisted.

use super::{DriftConfig, ReadingGenerator, ReadingSink};
use crate::alerting::{classify, AlertNotifier};
use crate::config::ThresholdConfig;
use crate::health::HealthRegistry;
use crate::models::Reading;
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::zones::ZoneId;
use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

/// Configuration for the generation loop
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Tick interval (default: 10 seconds)
    pub interval: Duration,
    pub drift: DriftConfig,
    /// Alert dedup window on reading timestamps (default: 15 minutes)
    pub dedup_window: chrono::Duration,
    /// Fixed seed for a replayable stream
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            drift: DriftConfig::default(),
            dedup_window: chrono::Duration::minutes(15),
            seed: None,
        }
    }
}

/// Outcome of a single tick
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickResults {
    pub readings: usize,
    pub out_of_band: usize,
    pub alerts: usize,
    pub persisted: bool,
}

/// Periodic generator that feeds a reading sink
pub struct GenerationLoop {
    generator: ReadingGenerator<StdRng>,
    sink: Arc<dyn ReadingSink>,
    notifier: AlertNotifier,
    thresholds: HashMap<ZoneId, ThresholdConfig>,
    previous: HashMap<ZoneId, Reading>,
    health: HealthRegistry,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    config: GenerationConfig,
}

impl GenerationLoop {
    pub fn new(
        sink: Arc<dyn ReadingSink>,
        health: HealthRegistry,
        logger: StructuredLogger,
        config: GenerationConfig,
    ) -> Result<Self> {
        let generator = match config.seed {
            Some(seed) => ReadingGenerator::seeded(seed, config.drift.clone())?,
            None => ReadingGenerator::from_os_rng(config.drift.clone())?,
        };
        let thresholds = ZoneId::ALL
            .iter()
            .map(|zone| (*zone, ThresholdConfig::for_zone(*zone)))
            .collect();

        Ok(Self {
            generator,
            sink,
            notifier: AlertNotifier::new().with_dedup_window(config.dedup_window),
            thresholds,
            previous: HashMap::new(),
            health,
            metrics: MonitorMetrics::new(),
            logger,
            config,
        })
    }

    /// Run until a shutdown signal arrives
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting reading generation loop"
        );

        self.metrics.set_zones_monitored(ZoneId::ALL.len() as i64);
        self.resume().await;

        let mut ticker = interval(self.config.interval);
        let mut tick_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let results = self.tick_at(now_local()).await;
                    tick_count += 1;

                    if tick_count % 6 == 0 {
                        debug!(
                            ticks = tick_count,
                            alerts = results.alerts,
                            persisted = results.persisted,
                            "Generation cycle complete"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    self.logger.log_shutdown("shutdown signal");
                    break;
                }
            }
        }
    }

    /// Seed the walk from what the sink already holds
    async fn resume(&mut self) {
        match self.sink.last_readings().await {
            Ok(previous) => {
                if !previous.is_empty() {
                    info!(zones = previous.len(), "Resuming from persisted readings");
                }
                self.previous = previous;
            }
            Err(e) => {
                warn!(error = %e, "Could not read previous readings, starting fresh");
            }
        }
    }

    /// Generate, classify and persist one batch at instant `at`
    ///
    /// Metrics and alert notifications are only raised for a batch that was
    /// persisted.
    pub async fn tick_at(&mut self, at: NaiveDateTime) -> TickResults {
        let start = Instant::now();
        let batch = self.generator.next_batch(&self.previous, at);
        let mut results = TickResults {
            readings: batch.len(),
            ..TickResults::default()
        };

        let mut classified = Vec::with_capacity(batch.len());
        for reading in &batch {
            let Some(config) = self.thresholds.get(&reading.zone) else {
                continue;
            };
            match classify(reading, config) {
                Ok(c) => classified.push(c),
                Err(e) => {
                    warn!(zone = %reading.zone, error = %e, "Skipping unclassifiable reading");
                }
            }
        }

        self.health.record_tick().await;
        match self.sink.append(&batch).await {
            Ok(()) => {
                results.persisted = true;
                self.health.record_write_success().await;
            }
            Err(e) => {
                self.metrics.inc_stream_write_errors();
                self.logger.log_write_failure("stream", &e.to_string());
                self.health.record_write_failure(e.to_string()).await;
                return results;
            }
        }

        for c in &classified {
            let reading = &c.reading;
            let Some(config) = self.thresholds.get(&reading.zone) else {
                continue;
            };

            let in_band = config.temperature_in_band(reading.temperature);
            self.metrics
                .record_reading(reading.zone, reading.temperature, in_band);
            if !in_band {
                results.out_of_band += 1;
                self.logger
                    .log_out_of_band(reading.zone, reading.temperature, c.severity);
            }

            if let Some(notification) = self.notifier.notify(c, config) {
                results.alerts += 1;
                self.metrics
                    .inc_alerts_raised(notification.zone, notification.severity);
                self.logger.log_alert(&notification);
            }
        }
        for reading in batch {
            self.previous.insert(reading.zone, reading);
        }

        let elapsed = start.elapsed();
        self.metrics.observe_generation_latency(elapsed.as_secs_f64());
        self.logger
            .log_batch(results.readings, results.out_of_band, elapsed.as_millis() as u64);

        results
    }
}

/// Current local time truncated to whole seconds
fn now_local() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Builder for the generation loop
pub struct GenerationLoopBuilder {
    sink: Option<Arc<dyn ReadingSink>>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
    config: GenerationConfig,
}

impl GenerationLoopBuilder {
    pub fn new() -> Self {
        Self {
            sink: None,
            health: None,
            logger: None,
            config: GenerationConfig::default(),
        }
    }

    pub fn sink(mut self, sink: Arc<dyn ReadingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn violation_probability(mut self, probability: f64) -> Self {
        self.config.drift.violation_probability = probability;
        self
    }

    pub fn dedup_window(mut self, window: chrono::Duration) -> Self {
        self.config.dedup_window = window;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> Result<GenerationLoop> {
        let sink = self
            .sink
            .ok_or_else(|| anyhow::anyhow!("Reading sink is required"))?;
        let tick_interval = self.config.interval;

        GenerationLoop::new(
            sink,
            self.health
                .unwrap_or_else(|| HealthRegistry::new(tick_interval)),
            self.logger
                .unwrap_or_else(|| StructuredLogger::new("default")),
            self.config,
        )
    }
}

impl Default for GenerationLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
