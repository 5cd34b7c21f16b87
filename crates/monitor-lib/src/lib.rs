//! Core library for the cold-storage monitor
//!
//! This crate provides:
//! - Zone profiles and validated threshold configuration
//! - Alert classification and notification
//! - Rolling performance scoring and trend forecasting
//! - Cost impact estimation
//! - The synthetic sensor stream generator and its CSV stream file
//! - Health checks and observability

pub mod alerting;
pub mod config;
pub mod cost;
pub mod error;
pub mod generator;
pub mod health;
pub mod models;
pub mod observability;
pub mod scoring;
pub mod stream;
pub mod summary;
pub mod zones;

pub use config::{AlertSensitivity, ThresholdConfig};
pub use error::MonitorError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use zones::{ZoneId, ZoneProfile};
