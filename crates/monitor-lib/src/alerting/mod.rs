//! Alert classification for temperature readings
//!
//! This module provides:
//! - Severity tiers by distance from the optimal band
//! - Sensitivity policies mapping tiers to a binary alert flag
//! - Deduplicated operator notifications
//! - Alert history summaries

mod classifier;
mod history;
mod notifier;

pub use classifier::{classify, classify_all, severity_for, ClassifiedReading, Severity};
pub use history::{hourly_alert_counts, AlertEvent, AlertHistory};
pub use notifier::{AlertNotification, AlertNotifier, Excursion};
