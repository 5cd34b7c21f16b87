//! Error taxonomy for classification, scoring and generation

use chrono::NaiveDateTime;

use crate::zones::ZoneId;

/// Errors raised by the monitoring core
///
/// All of these are local to a single call and recoverable by re-requesting
/// with a corrected configuration or window.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error("Invalid threshold configuration: {0}")]
    InvalidConfig(String),

    #[error("No readings available to score for {zone}")]
    EmptyWindow { zone: ZoneId },

    #[error(
        "Readings for {zone} are out of order at position {index}: {timestamp} precedes {previous}"
    )]
    NonMonotonicStream {
        zone: ZoneId,
        index: usize,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },

    #[error("Reading is missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("Unknown zone id: {0}")]
    UnknownZone(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
