//! Alert history commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::{
    alerting::{
        classify_all, hourly_alert_counts, AlertHistory, AlertNotification, AlertNotifier,
    },
    zone_readings, AlertSensitivity, ZoneId,
};
use serde::Serialize;
use tabled::Tabled;

use super::StreamContext;
use crate::output::{
    color_severity, format_humidity, format_temperature, print_heading, print_json, print_success,
    print_table, OutputFormat,
};

/// Hours of alert counts shown in the table view
const HOURLY_ROWS: usize = 6;

/// Notifications shown in the table view
const NOTIFICATION_ROWS: usize = 5;

/// Row for alert events table
#[derive(Tabled)]
struct AlertEventRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Level")]
    label: String,
}

/// Row for hourly alert counts
#[derive(Tabled, Serialize)]
struct HourlyRow {
    #[tabled(rename = "Hour")]
    hour: String,
    #[tabled(rename = "Alerts")]
    alerts: usize,
}

#[derive(Serialize)]
struct AlertReport {
    zone: ZoneId,
    sensitivity: AlertSensitivity,
    history: AlertHistory,
    hourly: Vec<HourlyRow>,
    notifications: Vec<AlertNotification>,
}

/// Show alert history for a zone, optionally at a different sensitivity
pub fn show_alerts(
    ctx: &StreamContext,
    zone: ZoneId,
    sensitivity: Option<AlertSensitivity>,
) -> Result<()> {
    let mut config = ctx.analyzer.threshold(zone);
    if let Some(sensitivity) = sensitivity {
        config = config.with_sensitivity(sensitivity);
    }

    let classified = classify_all(&zone_readings(&ctx.readings, zone), &config)?;
    let history = AlertHistory::from_stream(&classified, ctx.now);
    let hourly: Vec<HourlyRow> = hourly_alert_counts(&classified)
        .into_iter()
        .map(|(hour, alerts)| HourlyRow {
            hour: hour.format("%Y-%m-%d %H:00").to_string(),
            alerts,
        })
        .collect();
    let notifications = AlertNotifier::new().notify_all(&classified, &config);

    let report = AlertReport {
        zone,
        sensitivity: config.alert_sensitivity(),
        history,
        hourly,
        notifications,
    };

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(report),
    }

    Ok(())
}

fn print_report(report: AlertReport) {
    let history = &report.history;

    print_heading(&format!("{} Alerts", report.zone), 60);
    println!("Sensitivity:            {}", report.sensitivity.to_string().cyan());
    println!("Total alerts:           {}", history.total_alerts);
    println!("Last 24 hours:          {}", history.recent_alerts);
    println!(
        "Critical:               {}",
        if history.critical_alerts > 0 {
            history.critical_alerts.to_string().red().bold().to_string()
        } else {
            history.critical_alerts.to_string()
        }
    );
    println!("Alert rate:             {:.1}%", history.alert_rate_pct);
    println!();

    if history.total_alerts == 0 {
        print_success("No alerts for this zone");
        return;
    }

    println!("{}", "Recent Alert Events".bold());
    println!("{}", "-".repeat(60));
    let rows: Vec<AlertEventRow> = history
        .recent_events
        .iter()
        .rev()
        .map(|e| AlertEventRow {
            timestamp: e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            temperature: format_temperature(e.temperature),
            humidity: format_humidity(e.humidity),
            severity: color_severity(e.severity),
            label: e.label.clone(),
        })
        .collect();
    print_table(rows);
    println!();

    println!("{}", "Alerts per Hour".bold());
    println!("{}", "-".repeat(60));
    let skip = report.hourly.len().saturating_sub(HOURLY_ROWS);
    print_table(report.hourly.into_iter().skip(skip).collect());
    println!();

    println!(
        "{} ({} after de-duplication)",
        "Notifications".bold(),
        report.notifications.len()
    );
    println!("{}", "-".repeat(60));
    let skip = report.notifications.len().saturating_sub(NOTIFICATION_ROWS);
    for notification in report.notifications.iter().skip(skip) {
        println!(
            "  {}  {}  {}",
            notification.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            color_severity(notification.severity),
            notification.message
        );
    }
}
