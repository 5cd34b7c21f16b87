//! Performance score, zone analysis and trend forecast commands

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use monitor_lib::{
    scoring::{MaintenanceAction, TrendForecast, ZoneAnalysis, ZoneScore},
    stream::export_scores,
    ZoneId,
};
use serde::Serialize;
use tabled::Tabled;

use super::StreamContext;
use crate::output::{
    color_risk, color_score, format_currency, format_temperature, print_heading, print_info,
    print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for the all-zones score table
#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Temp /40")]
    temperature: String,
    #[tabled(rename = "Alerts /30")]
    alerts: String,
    #[tabled(rename = "Quality /20")]
    quality: String,
    #[tabled(rename = "Efficiency /10")]
    efficiency: String,
    #[tabled(rename = "Window")]
    window: String,
}

/// Row for the forecast table
#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Slope/reading")]
    slope: String,
    #[tabled(rename = "Next")]
    next: String,
    #[tabled(rename = "+6")]
    sixth: String,
    #[tabled(rename = "+12")]
    twelfth: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Level")]
    level: String,
}

/// Row for the deviation report
#[derive(Tabled)]
struct DeviationRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "Temperature")]
    temperature: String,
    #[tabled(rename = "Deviation")]
    kind: String,
    #[tabled(rename = "Magnitude")]
    magnitude: String,
}

/// Forecast plus the follow-ups it implies
#[derive(Serialize)]
struct ForecastEntry<'a> {
    #[serde(flatten)]
    forecast: &'a TrendForecast,
    maintenance: Vec<MaintenanceAction>,
}

fn score_row(score: &ZoneScore) -> ScoreRow {
    ScoreRow {
        zone: score.zone.to_string(),
        score: color_score(score.total_score),
        band: score.band().to_string(),
        temperature: format!("{:.1}", score.temperature_score),
        alerts: format!("{:.1}", score.alert_score),
        quality: format!("{:.1}", score.data_quality_score),
        efficiency: format!("{:.1}", score.efficiency_score),
        window: score.window_len.to_string(),
    }
}

fn projection(forecast: &TrendForecast, step: usize) -> String {
    forecast
        .projected
        .get(step - 1)
        .map(|t| format_temperature(*t))
        .unwrap_or_else(|| "-".to_string())
}

/// Show the score table for all zones, optionally saving it as CSV
pub fn show_scores(ctx: &StreamContext, output: Option<&Path>) -> Result<()> {
    let report = ctx.system_report()?;
    let scores: Vec<ZoneScore> = report
        .zones
        .iter()
        .filter_map(|r| r.score.as_ref().map(ZoneScore::rounded))
        .collect();

    if let Some(path) = output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create score file {}", path.display()))?;
        export_scores(file, &scores)?;
        if matches!(ctx.format, OutputFormat::Table) {
            print_success(&format!("Scores saved to {}", path.display()));
        }
    }

    match ctx.format {
        OutputFormat::Json => print_json(&scores)?,
        OutputFormat::Table => {
            print_heading("Performance Scores", 70);
            print_table(scores.iter().map(score_row).collect());

            let missing: Vec<String> = report
                .zones
                .iter()
                .filter(|r| r.score.is_none())
                .map(|r| r.zone.to_string())
                .collect();
            if !missing.is_empty() {
                print_warning(&format!("No readings for {}", missing.join(", ")));
            }
            if let Some(avg) = report.average_score {
                println!();
                println!("System average:         {}", color_score(avg));
            }
        }
    }

    Ok(())
}

/// Show the score breakdown for one zone
pub fn show_zone_score(ctx: &StreamContext, zone: ZoneId) -> Result<()> {
    let report = ctx.zone_report(zone)?;
    let score = report.score.as_ref().map(ZoneScore::rounded);

    match (ctx.format, score) {
        (OutputFormat::Json, score) => print_json(&score)?,
        (OutputFormat::Table, None) => {
            print_warning(&format!("No readings for {} in the selected range", zone));
        }
        (OutputFormat::Table, Some(score)) => {
            print_heading(&format!("{} Performance", zone), 50);
            println!(
                "{} {} ({})",
                "Total Score:".bold(),
                color_score(score.total_score),
                score.band()
            );
            println!("Window:                 {} readings", score.window_len);
            println!();

            println!("{}", "Breakdown".bold());
            println!("{}", "-".repeat(50));
            println!(
                "Temperature control:    {:>5.1} / 40   ({:.1}% in band, stability {:.2})",
                score.temperature_score, score.temp_compliance_pct, score.temp_stability
            );
            println!(
                "Alert management:       {:>5.1} / 30   ({:.1}% alert rate)",
                score.alert_score, score.alert_rate_pct
            );
            println!(
                "Data quality:           {:>5.1} / 20   (last reading {:.1} min ago)",
                score.data_quality_score, score.data_freshness_minutes
            );
            println!("Efficiency:             {:>5.1} / 10", score.efficiency_score);

            if let Some(analysis) = &report.analysis {
                println!();
                println!("{} {}", "Zone focus:".bold(), analysis.headline());
            }

            if let Some(cost) = &report.cost {
                println!();
                print_info(&format!(
                    "Estimated monthly cost impact {}; run `coldstore costs` for details",
                    format_currency(cost.total_monthly_cost)
                ));
            }
        }
    }

    Ok(())
}

/// Show the zone-specific analysis and deviation report for one zone
pub fn show_analysis(ctx: &StreamContext, zone: ZoneId) -> Result<()> {
    let report = ctx.zone_report(zone)?;

    match (ctx.format, &report.analysis) {
        (OutputFormat::Json, analysis) => print_json(analysis)?,
        (OutputFormat::Table, None) => {
            print_warning(&format!("No readings for {} in the selected range", zone));
        }
        (OutputFormat::Table, Some(analysis)) => print_analysis(analysis),
    }

    Ok(())
}

fn print_analysis(analysis: &ZoneAnalysis) {
    print_heading(&format!("{} Analysis", analysis.zone), 60);
    println!("{} {}", "Focus:".bold(), analysis.headline());
    println!("Readings analyzed:      {}", analysis.readings_analyzed);
    println!();

    println!("Temperature compliance: {:>6.1}%", analysis.temp_compliance_pct);
    println!("Humidity compliance:    {:>6.1}%", analysis.humidity_compliance_pct);
    println!("Stability (std dev):    {:>6.2}°C", analysis.temp_stability);
    println!("Avg deviation:          ±{:.2}°C from band centre", analysis.avg_deviation);
    println!("Energy score:           {:>6.0} / 100", analysis.energy_score);
    println!("Freshness score:        {:>6.1} / 100", analysis.freshness_score);
    println!(
        "Regulatory compliance:  {:>6.1} / 100   ({} critical deviations)",
        analysis.regulatory_score, analysis.critical_deviations
    );
    println!();

    if analysis.deviation_count == 0 {
        print_success("No temperature deviations");
        return;
    }

    println!("{}", format!("{} temperature deviations", analysis.deviation_count).red().bold());
    let rows: Vec<DeviationRow> = analysis
        .deviations
        .iter()
        .map(|d| DeviationRow {
            timestamp: d.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            temperature: format!("{:.2}°C", d.temperature),
            kind: d.kind.to_string(),
            magnitude: format!("{:.2}°C", d.magnitude),
        })
        .collect();
    print_table(rows);
    if analysis.deviation_count > analysis.deviations.len() {
        print_info(&format!("Showing the first {}", analysis.deviations.len()));
    }
}

/// Show trend forecasts for all zones
pub fn show_forecast(ctx: &StreamContext) -> Result<()> {
    let report = ctx.system_report()?;
    let forecasts: Vec<&TrendForecast> = report
        .zones
        .iter()
        .filter_map(|r| r.forecast.as_ref())
        .collect();

    match ctx.format {
        OutputFormat::Json => {
            let entries: Vec<ForecastEntry> = forecasts
                .iter()
                .map(|&f| ForecastEntry {
                    forecast: f,
                    maintenance: f.maintenance(),
                })
                .collect();
            print_json(&entries)?
        }
        OutputFormat::Table => {
            print_heading("Temperature Forecast", 70);

            let rows: Vec<ForecastRow> = forecasts
                .iter()
                .map(|f| ForecastRow {
                    zone: f.zone.to_string(),
                    current: format_temperature(f.current_temperature),
                    slope: format!("{:+.3}", f.slope),
                    next: projection(f, 1),
                    sixth: projection(f, 6),
                    twelfth: projection(f, 12),
                    risk: format!("{:.0}%", f.risk_pct),
                    level: color_risk(f.risk_level),
                })
                .collect();
            print_table(rows);

            for r in report.zones.iter().filter(|r| r.forecast.is_none()) {
                print_warning(&format!(
                    "{}: not enough readings for a forecast (need at least 10)",
                    r.zone
                ));
            }

            println!();
            println!("{}", "Maintenance".bold());
            let actions: Vec<(ZoneId, MaintenanceAction)> = forecasts
                .iter()
                .flat_map(|f| f.maintenance().into_iter().map(move |a| (f.zone, a)))
                .collect();
            if actions.is_empty() {
                print_success("All zones show stable trends, no maintenance required");
            }
            for (i, (zone, action)) in actions.iter().enumerate() {
                println!("{}. {}: {}", i + 1, zone, action);
            }
        }
    }

    Ok(())
}
