//! Cost-related CLI commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::{
    cost::{CostEstimate, SystemCostSummary},
    ZoneId,
};
use serde::Serialize;
use tabled::Tabled;

use super::StreamContext;
use crate::output::{
    format_currency, print_heading, print_json, print_table, print_warning, OutputFormat,
};

/// Row for the per-zone cost table
#[derive(Tabled)]
struct ZoneCostRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Product Loss")]
    product_loss: String,
    #[tabled(rename = "Energy Waste")]
    energy_waste: String,
    #[tabled(rename = "Maintenance")]
    maintenance: String,
    #[tabled(rename = "Compliance")]
    compliance: String,
    #[tabled(rename = "Total/mo")]
    total: String,
    #[tabled(rename = "Savings/mo")]
    savings: String,
    #[tabled(rename = "ROI")]
    roi: String,
}

/// Row for priority and quick-win tables
#[derive(Tabled)]
struct RankedRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[derive(Serialize)]
struct CostReport<'a> {
    zones: Vec<&'a CostEstimate>,
    summary: &'a SystemCostSummary,
}

/// Show cost impact, totals and optimization priorities
pub fn show_costs(ctx: &StreamContext) -> Result<()> {
    let report = ctx.system_report()?;
    let estimates: Vec<&CostEstimate> = report
        .zones
        .iter()
        .filter_map(|r| r.cost.as_ref())
        .collect();
    let summary = &report.costs;

    match ctx.format {
        OutputFormat::Json => {
            print_json(&CostReport {
                zones: estimates,
                summary,
            })?;
        }
        OutputFormat::Table => {
            print_heading("Cost Impact Analysis", 70);

            if estimates.is_empty() {
                print_warning("No readings in the selected range");
                return Ok(());
            }

            let rows: Vec<ZoneCostRow> = estimates
                .iter()
                .map(|e| ZoneCostRow {
                    zone: e.zone.to_string(),
                    product_loss: format_currency(e.product_loss_cost),
                    energy_waste: format_currency(e.energy_waste_cost),
                    maintenance: format_currency(e.excess_maintenance_cost),
                    compliance: format_currency(e.compliance_risk_cost),
                    total: format_currency(e.total_monthly_cost),
                    savings: format_currency(e.potential_monthly_savings).green().to_string(),
                    roi: format!("{:.1}%", e.roi_opportunity_pct()),
                })
                .collect();
            print_table(rows);
            println!();

            println!("{}", "System Totals".bold());
            println!("{}", "-".repeat(50));
            println!(
                "Monthly cost impact:    {}",
                format_currency(summary.total_monthly_cost).red()
            );
            println!(
                "Annual cost impact:     {}",
                format_currency(summary.annual_cost_impact)
            );
            println!(
                "{} {} ({:.1}% ROI)",
                "Potential Savings:".bold(),
                format_currency(summary.total_potential_savings).green().bold(),
                summary.roi_percentage
            );
            println!(
                "Annual savings:         {}",
                format_currency(summary.annual_savings_potential).green()
            );
            println!();

            println!("{}", "Optimization Priorities".bold());
            println!("{}", "-".repeat(50));
            print_table(ranked(&summary.priorities));
            println!();

            println!("{}", "Quick Wins".bold());
            println!("{}", "-".repeat(50));
            print_table(ranked(&summary.quick_wins));
            println!(
                "Fixing the top two saves {} per month",
                format_currency(summary.combined_quick_win_savings).green().bold()
            );
        }
    }

    Ok(())
}

fn ranked(entries: &[(ZoneId, f64)]) -> Vec<RankedRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, (zone, amount))| RankedRow {
            rank: i + 1,
            zone: zone.to_string(),
            amount: format_currency(*amount),
        })
        .collect()
}
