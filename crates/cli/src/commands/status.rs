//! Zone status and recent-reading commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::{summary::ZoneSummary, ZoneId};
use tabled::Tabled;

use super::StreamContext;
use crate::output::{
    color_score, color_severity, color_status, format_humidity, format_temperature, print_heading,
    print_info, print_json, print_table, print_warning, OutputFormat,
};

/// Row for the zone overview table
#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Alerts")]
    alerts: String,
    #[tabled(rename = "Last Reading")]
    last_reading: String,
}

/// Row for the readings table
#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Alert")]
    alert: String,
}

fn format_trend(trend: Option<f64>) -> String {
    match trend {
        Some(t) if t > 0.0 => format!("↑ {:+.2}", t),
        Some(t) if t < 0.0 => format!("↓ {:+.2}", t),
        Some(_) => "→ 0.00".to_string(),
        None => "-".to_string(),
    }
}

/// Show the status overview for all zones
pub fn show_zones(ctx: &StreamContext) -> Result<()> {
    let report = ctx.system_report()?;
    let summaries: Vec<&ZoneSummary> = report
        .zones
        .iter()
        .filter_map(|r| r.summary.as_ref())
        .collect();

    match ctx.format {
        OutputFormat::Json => print_json(&summaries)?,
        OutputFormat::Table => {
            print_heading("Warehouse Zones", 70);

            let rows: Vec<ZoneRow> = report
                .zones
                .iter()
                .map(|r| match &r.summary {
                    Some(s) => ZoneRow {
                        zone: r.zone.to_string(),
                        temperature: format_temperature(s.latest_temperature),
                        humidity: format_humidity(s.latest_humidity),
                        band: r.zone.profile().temp_threshold_label(),
                        trend: format_trend(s.trend),
                        status: color_status(s.status),
                        score: s.score.map(color_score).unwrap_or_else(|| "-".to_string()),
                        alerts: format!("{} ({:.1}%)", s.alert_count, s.alert_rate_pct),
                        last_reading: s.latest_timestamp.format("%Y-%m-%d %H:%M").to_string(),
                    },
                    None => ZoneRow {
                        zone: r.zone.to_string(),
                        temperature: "-".to_string(),
                        humidity: "-".to_string(),
                        band: r.zone.profile().temp_threshold_label(),
                        trend: "-".to_string(),
                        status: "no data".dimmed().to_string(),
                        score: "-".to_string(),
                        alerts: "-".to_string(),
                        last_reading: "-".to_string(),
                    },
                })
                .collect();
            print_table(rows);
            println!();

            match report.average_score {
                Some(avg) => println!(
                    "Average score:          {}   ({} of {} zones performing well)",
                    color_score(avg),
                    report.zones_performing_well,
                    ZoneId::ALL.len()
                ),
                None => print_warning("No readings in the selected range"),
            }
            println!("Readings analyzed:      {}", ctx.readings.len());
        }
    }

    Ok(())
}

/// Show the most recent classified readings for a zone, newest first
pub fn show_readings(ctx: &StreamContext, zone: ZoneId, limit: usize) -> Result<()> {
    let report = ctx.zone_report(zone)?;
    let recent: Vec<_> = report.classified.iter().rev().take(limit).collect();

    match ctx.format {
        OutputFormat::Json => print_json(&recent)?,
        OutputFormat::Table => {
            let profile = zone.profile();
            print_heading(&format!("{} Readings", zone), 60);
            println!("Stores:      {}", profile.description.cyan());
            println!(
                "Band:        {:.1} to {:.1} °C (buffer {:.1})",
                report.config.temp_min(),
                report.config.temp_max(),
                report.config.warning_buffer()
            );
            println!(
                "Humidity:    {:.0} to {:.0}%",
                report.config.humidity_min(),
                report.config.humidity_max()
            );
            println!("Sensitivity: {}", report.config.alert_sensitivity());
            println!();

            if recent.is_empty() {
                print_warning("No readings found for this zone");
                return Ok(());
            }

            let rows: Vec<ReadingRow> = recent
                .iter()
                .map(|c| ReadingRow {
                    timestamp: c.reading.timestamp_label(),
                    temperature: format_temperature(c.reading.temperature),
                    humidity: format_humidity(c.reading.humidity),
                    severity: color_severity(c.severity),
                    alert: if c.alert_flag {
                        "yes".red().bold().to_string()
                    } else {
                        "no".to_string()
                    },
                })
                .collect();
            print_table(rows);

            if report.classified.len() > recent.len() {
                println!();
                print_info(&format!(
                    "Showing {} of {} readings; use --limit to see more",
                    recent.len(),
                    report.classified.len()
                ));
            }
        }
    }

    Ok(())
}
