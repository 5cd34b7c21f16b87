//! Synthetic sensor stream generation
//!
//! This module simulates the warehouse sensors: a bounded random walk per
//! zone and the periodic loop that appends each batch to a reading sink.

mod drift;
mod r#loop;

pub use drift::{daily_variation, sanitize_previous, DriftConfig, ReadingGenerator};
pub use r#loop::{GenerationConfig, GenerationLoop, GenerationLoopBuilder, TickResults};

use crate::models::Reading;
use crate::zones::ZoneId;
use anyhow::Result;
use std::collections::HashMap;

pub use async_trait::async_trait;

/// Destination for generated readings
#[async_trait]
pub trait ReadingSink: Send + Sync {
    /// Append a batch in order
    async fn append(&self, readings: &[Reading]) -> Result<()>;

    /// Most recent persisted reading per zone, used to resume the walk
    async fn last_readings(&self) -> Result<HashMap<ZoneId, Reading>>;
}
