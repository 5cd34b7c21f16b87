//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use monitor_lib::{
    alerting::Severity,
    scoring::{RiskLevel, ScoreBand},
    summary::ZoneStatus,
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a rounded table, or a notice when there are no rows
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a section heading with an underline
pub fn print_heading(title: &str, width: usize) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(width));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format dollars with thousands separators
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{:.1}°C", celsius)
}

/// Humidity, or a dash when it was not recorded
pub fn format_humidity(humidity: Option<f64>) -> String {
    humidity
        .map(|h| format!("{:.1}%", h))
        .unwrap_or_else(|| "-".to_string())
}

pub fn color_severity(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Normal => label.green().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Alert => label.truecolor(255, 140, 0).to_string(),
        Severity::Critical => label.red().bold().to_string(),
    }
}

pub fn color_status(status: ZoneStatus) -> String {
    let label = status.to_string();
    match status {
        ZoneStatus::Optimal => label.green().to_string(),
        ZoneStatus::Warning => label.yellow().to_string(),
        ZoneStatus::Critical => label.red().to_string(),
    }
}

/// Color a score by its band
pub fn color_score(score: f64) -> String {
    let formatted = format!("{:.1}", score);
    match ScoreBand::from_score(score) {
        ScoreBand::Excellent | ScoreBand::Good => formatted.green().to_string(),
        ScoreBand::Fair => formatted.yellow().to_string(),
        ScoreBand::Poor | ScoreBand::Critical => formatted.red().to_string(),
    }
}

pub fn color_risk(level: RiskLevel) -> String {
    let label = level.to_string();
    match level {
        RiskLevel::Low => label.green().to_string(),
        RiskLevel::Medium => label.yellow().to_string(),
        RiskLevel::High => label.red().bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(950.5), "$950.50");
        assert_eq!(format_currency(2500.0), "$2,500.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-1200.0), "-$1,200.00");
    }

    #[test]
    fn test_format_humidity_missing() {
        assert_eq!(format_humidity(None), "-");
        assert_eq!(format_humidity(Some(61.3)), "61.3%");
    }
}
