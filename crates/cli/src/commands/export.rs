//! Classified reading export

use std::path::Path;

use anyhow::{Context, Result};
use monitor_lib::{stream::export_classified_to_path, ZoneId};
use serde_json::json;

use super::StreamContext;
use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};

/// Write a zone's classified readings to a CSV file
pub fn export_zone(ctx: &StreamContext, zone: ZoneId, output: &Path) -> Result<()> {
    let report = ctx.zone_report(zone)?;

    if report.classified.is_empty() && matches!(ctx.format, OutputFormat::Table) {
        print_warning(&format!("No readings for {} in the selected range", zone));
        print_info("The export file will be empty");
    }

    export_classified_to_path(output, &report.classified)
        .with_context(|| format!("Failed to export readings to {}", output.display()))?;

    let alerts = report.classified.iter().filter(|c| c.alert_flag).count();
    match ctx.format {
        OutputFormat::Json => print_json(&json!({
            "zone": zone,
            "output": output.display().to_string(),
            "readings": report.classified.len(),
            "alerts": alerts,
        }))?,
        OutputFormat::Table => {
            print_success(&format!(
                "Exported {} readings for {} to {}",
                report.classified.len(),
                zone,
                output.display()
            ));
            println!("Alert-flagged readings: {}", alerts);
        }
    }

    Ok(())
}
