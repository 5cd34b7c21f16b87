//! Generator daemon health
//!
//! Health is derived from what the generation loop reports rather than set
//! directly:
//! - `generator` goes stale when ticks stop arriving
//! - `stream_writer` degrades on a failed append and turns unhealthy after
//!   repeated consecutive failures
//!
//! The daemon is ready once a batch has been persisted and nothing is unhealthy.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Ticks that may be missed before the generator counts as degraded
const DEGRADED_AFTER_MISSED_TICKS: u32 = 3;

/// Ticks that may be missed before the generator counts as unhealthy
const UNHEALTHY_AFTER_MISSED_TICKS: u32 = 10;

/// Consecutive failed appends before the writer counts as unhealthy
const UNHEALTHY_AFTER_WRITE_FAILURES: u32 = 5;

/// Ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still producing readings, but late or with failures
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
        }
    }

    fn with_message(status: ComponentStatus, message: String) -> Self {
        Self {
            status,
            message: Some(message),
        }
    }
}

/// Body of the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub generator: ComponentHealth,
    pub stream_writer: ComponentHealth,
    pub ticks: u64,
    pub batches_persisted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug)]
struct LoopActivity {
    started: Instant,
    last_tick: Option<Instant>,
    ticks: u64,
    batches_persisted: u64,
    consecutive_write_failures: u32,
    last_write_error: Option<String>,
}

/// Shared view of the generation loop's activity
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    tick_interval: Duration,
    activity: Arc<RwLock<LoopActivity>>,
}

impl HealthRegistry {
    /// Registry for a loop that ticks every `tick_interval`
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            activity: Arc::new(RwLock::new(LoopActivity {
                started: Instant::now(),
                last_tick: None,
                ticks: 0,
                batches_persisted: 0,
                consecutive_write_failures: 0,
                last_write_error: None,
            })),
        }
    }

    pub async fn record_tick(&self) {
        let mut activity = self.activity.write().await;
        activity.last_tick = Some(Instant::now());
        activity.ticks += 1;
    }

    pub async fn record_write_success(&self) {
        let mut activity = self.activity.write().await;
        activity.batches_persisted += 1;
        activity.consecutive_write_failures = 0;
        activity.last_write_error = None;
    }

    pub async fn record_write_failure(&self, error: impl Into<String>) {
        let mut activity = self.activity.write().await;
        activity.consecutive_write_failures += 1;
        activity.last_write_error = Some(error.into());
    }

    pub async fn health(&self) -> HealthResponse {
        self.health_at(Instant::now()).await
    }

    /// Health as of `now`
    pub async fn health_at(&self, now: Instant) -> HealthResponse {
        let activity = self.activity.read().await;
        let generator = self.generator_health(&activity, now);
        let stream_writer = writer_health(&activity);

        HealthResponse {
            status: generator.status.max(stream_writer.status),
            generator,
            stream_writer,
            ticks: activity.ticks,
            batches_persisted: activity.batches_persisted,
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let health = self.health().await;

        let reason = if health.batches_persisted == 0 {
            Some("No readings persisted yet".to_string())
        } else if !health.status.is_operational() {
            Some("Component unhealthy".to_string())
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }

    fn generator_health(&self, activity: &LoopActivity, now: Instant) -> ComponentHealth {
        let since = activity.last_tick.unwrap_or(activity.started);
        let idle = now.saturating_duration_since(since);

        let status = if idle > self.tick_interval * UNHEALTHY_AFTER_MISSED_TICKS {
            ComponentStatus::Unhealthy
        } else if idle > self.tick_interval * DEGRADED_AFTER_MISSED_TICKS {
            ComponentStatus::Degraded
        } else {
            return ComponentHealth::healthy();
        };

        let message = match activity.last_tick {
            Some(_) => format!("No tick for {}s", idle.as_secs()),
            None => format!("No tick since start {}s ago", idle.as_secs()),
        };
        ComponentHealth::with_message(status, message)
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

fn writer_health(activity: &LoopActivity) -> ComponentHealth {
    let failures = activity.consecutive_write_failures;
    if failures == 0 {
        return ComponentHealth::healthy();
    }

    let status = if failures >= UNHEALTHY_AFTER_WRITE_FAILURES {
        ComponentStatus::Unhealthy
    } else {
        ComponentStatus::Degraded
    };
    let error = activity.last_write_error.as_deref().unwrap_or("unknown error");
    ComponentHealth::with_message(status, format!("{} failed appends: {}", failures, error))
}
