//! CLI integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const HEADER: &str = "timestamp,zone_id,temperature,humidity,temp_threshold,humidity_threshold";

fn coldstore() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_coldstore"));
    cmd.env_remove("COLDSTORE_DATA").env_remove("RUST_LOG");
    cmd
}

/// Twenty minutes of Freezer and Chiller readings on 2024-01-15
///
/// Chiller goes critical at 12:10 and 12:11 and sits just above its band at
/// 12:15. Two unusable rows are mixed in.
fn write_stream(dir: &Path) -> PathBuf {
    let mut lines = vec![HEADER.to_string()];
    for minute in 0..20 {
        let ts = format!("2024-01-15 12:{:02}:00", minute);
        lines.push(format!("{ts},Z1-Freezer,-20.0,60.0,-22 to -18 °C,50 to 70%"));
        let chiller = match minute {
            10 | 11 => 9.0,
            15 => 6.0,
            _ => 3.5,
        };
        lines.push(format!("{ts},Z2-Chiller,{chiller},75.0,2 to 5 °C,70 to 80%"));
    }
    lines.push("2024-01-15 12:20:00,Z9-Attic,4.0,50.0,,".to_string());
    lines.push("2024-01-15 12:20:00,Z1-Freezer,NaN,60.0,,".to_string());

    let path = dir.join("stream.csv");
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn run(data: &Path, args: &[&str]) -> Output {
    coldstore()
        .arg("--data")
        .arg(data)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn run_json(data: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--format", "json"];
    full.extend_from_slice(args);
    let output = run(data, &full);
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_cli_help() {
    let output = coldstore().arg("--help").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("cold-storage"), "Should show app description");
    for command in ["zones", "readings", "alerts", "score", "analyze", "costs", "forecast", "export"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
    assert!(stdout.contains("COLDSTORE_DATA"), "Should show env var");
    assert!(stdout.contains("--from"), "Should show date filter");
}

#[test]
fn test_cli_version() {
    let output = coldstore().arg("--version").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("coldstore"), "Should show binary name");
}

#[test]
fn test_alerts_help_lists_sensitivity() {
    let output = coldstore().args(["alerts", "--help"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--sensitivity"));
}

#[test]
fn test_zones_reports_only_zones_with_data() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let zones = run_json(&data, &["zones"]);
    let zones = zones.as_array().unwrap();

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0]["zone"], "Z1-Freezer");
    assert_eq!(zones[0]["data_points"], 20);
    assert_eq!(zones[0]["status"], "optimal");
    assert_eq!(zones[1]["zone"], "Z2-Chiller");
    assert_eq!(zones[1]["alert_count"], 2);
}

#[test]
fn test_zones_table_output() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let output = run(&data, &["zones"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Z1-Freezer"));
    assert!(stdout.contains("Z4-Pharma"));
    assert!(stdout.contains("no data"));
}

#[test]
fn test_readings_newest_first_with_limit() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let readings = run_json(&data, &["readings", "chiller", "--limit", "5"]);
    let readings = readings.as_array().unwrap();

    assert_eq!(readings.len(), 5);
    assert_eq!(readings[0]["reading"]["timestamp"], "2024-01-15T12:19:00");
    assert_eq!(readings[4]["reading"]["timestamp"], "2024-01-15T12:15:00");
    assert_eq!(readings[4]["severity"], "warning");
    assert_eq!(readings[4]["alert_flag"], false);
}

#[test]
fn test_alerts_history_and_deduplicated_notifications() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let report = run_json(&data, &["alerts", "Z2-Chiller"]);

    assert_eq!(report["sensitivity"], "Medium");
    assert_eq!(report["history"]["total_alerts"], 2);
    assert_eq!(report["history"]["critical_alerts"], 2);
    assert_eq!(report["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(
        report["notifications"][0]["message"],
        "Temperature critically high: 9.0°C"
    );
}

#[test]
fn test_alerts_sensitivity_override() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let report = run_json(&data, &["alerts", "chiller", "--sensitivity", "high"]);

    assert_eq!(report["sensitivity"], "High");
    assert_eq!(report["history"]["total_alerts"], 3);
}

#[test]
fn test_threshold_override_file() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"thresholds": {"Z2-Chiller": {"temp_max": 10.0}}}"#).unwrap();

    let report = run_json(
        &data,
        &["--config", config.to_str().unwrap(), "alerts", "chiller"],
    );

    assert_eq!(report["history"]["total_alerts"], 0);
}

#[test]
fn test_score_single_zone() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let score = run_json(&data, &["score", "freezer"]);

    assert_eq!(score["zone"], "Z1-Freezer");
    assert_eq!(score["window_len"], 20);
    assert_eq!(score["temp_compliance_pct"], 100.0);
    assert_eq!(score["alert_score"], 30.0);
}

#[test]
fn test_score_zone_without_data_is_null() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let score = run_json(&data, &["score", "pharma"]);
    assert!(score.is_null());
}

#[test]
fn test_score_table_saved_as_csv() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());
    let out = dir.path().join("scores.csv");

    let output = run(&data, &["score", "--output", out.to_str().unwrap()]);
    assert!(output.status.success());

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("total_score"));
    assert!(lines[1].starts_with("Z1-Freezer"));
}

#[test]
fn test_costs_priorities() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let costs = run_json(&data, &["costs"]);

    assert_eq!(costs["zones"].as_array().unwrap().len(), 2);
    assert_eq!(costs["summary"]["priorities"].as_array().unwrap().len(), 2);
    let monthly = costs["summary"]["total_monthly_cost"].as_f64().unwrap();
    let annual = costs["summary"]["annual_cost_impact"].as_f64().unwrap();
    assert!((annual - monthly * 12.0).abs() < 1e-6);
}

#[test]
fn test_forecast_for_zones_with_enough_readings() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let forecasts = run_json(&data, &["forecast"]);
    let forecasts = forecasts.as_array().unwrap();

    assert_eq!(forecasts.len(), 2);
    assert_eq!(forecasts[0]["zone"], "Z1-Freezer");
    assert_eq!(forecasts[0]["risk_level"], "Low");
    assert_eq!(forecasts[0]["projected"].as_array().unwrap().len(), 12);
    assert!(forecasts[0]["maintenance"].as_array().unwrap().is_empty());
}

#[test]
fn test_analyze_reports_zone_metrics_and_deviations() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let analysis = run_json(&data, &["analyze", "chiller"]);

    assert_eq!(analysis["zone"], "Z2-Chiller");
    assert_eq!(analysis["readings_analyzed"], 20);
    assert_eq!(analysis["humidity_compliance_pct"], 100.0);
    assert_eq!(analysis["critical_deviations"], 2);
    assert_eq!(analysis["deviation_count"], 3);
    assert_eq!(analysis["deviations"][0]["kind"], "above_maximum");
    assert_eq!(analysis["deviations"][0]["magnitude"], 4.0);
    let regulatory = analysis["regulatory_score"].as_f64().unwrap();
    assert!((regulatory - 65.0).abs() < 1e-9);
}

#[test]
fn test_analyze_table_shows_deviation_report() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let output = run(&data, &["analyze", "chiller"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Energy score"));
    assert!(stdout.contains("ABOVE MAXIMUM"));
}

#[test]
fn test_export_writes_classified_csv() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());
    let out = dir.path().join("chiller.csv");

    let output = run(&data, &["export", "chiller", "--output", out.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Exported 20 readings"));

    let csv = fs::read_to_string(&out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,zone_id,temperature,humidity,severity,alert_flag,humidity_in_band")
    );
    assert_eq!(lines.count(), 20);
}

#[test]
fn test_date_filter_excludes_other_days() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let zones = run_json(&data, &["--from", "2024-01-16", "zones"]);
    assert!(zones.as_array().unwrap().is_empty());
}

#[test]
fn test_reversed_date_range_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let output = run(&data, &["--from", "2024-01-16", "--to", "2024-01-15", "zones"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_stream_file_fails() {
    let dir = TempDir::new().unwrap();

    let output = run(&dir.path().join("absent.csv"), &["zones"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load sensor stream"));
}

#[test]
fn test_unknown_zone_rejected() {
    let dir = TempDir::new().unwrap();
    let data = write_stream(dir.path());

    let output = run(&data, &["readings", "Z9-Attic"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown zone"), "Should name the bad zone: {}", stderr);
}

#[test]
fn test_invalid_command() {
    let output = coldstore().arg("invalid-command").output().unwrap();

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should show error message");
}
