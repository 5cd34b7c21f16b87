//! Monthly cost impact estimation
//!
//! Translates a zone's performance into dollar figures: product loss from
//! alerts, energy waste from running off the optimal point, excess
//! maintenance for poorly performing zones and compliance risk from frequent
//! alerts. All figures are monthly and non-negative.

use serde::{Deserialize, Serialize};

use crate::scoring::ZoneScore;
use crate::zones::ZoneId;

/// Months per year for annualized figures
const MONTHS_PER_YEAR: f64 = 12.0;

/// Zones summed into the combined quick-win figure
const QUICK_WIN_COUNT: usize = 2;

/// Cost coefficients
///
/// Per-zone loss rates and optimal points come from the zone profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Monthly energy spend per zone
    pub base_energy_cost: f64,
    /// Fraction of energy wasted per degree from the optimal point
    pub waste_rate_per_degree: f64,
    /// Upper bound on the wasted fraction
    pub max_waste_fraction: f64,
    /// Monthly maintenance spend per zone
    pub base_maintenance_cost: f64,
    pub maintenance_multiplier: f64,
    /// Scores at or above this carry no excess maintenance
    pub maintenance_score_threshold: f64,
    /// (alert rate % strictly above, monthly cost), highest first
    pub compliance_tiers: Vec<(f64, f64)>,
    pub product_loss_recapture: f64,
    pub energy_recapture: f64,
    pub maintenance_recapture: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base_energy_cost: 800.0,
            waste_rate_per_degree: 0.05,
            max_waste_fraction: 0.50,
            base_maintenance_cost: 200.0,
            maintenance_multiplier: 1.2,
            maintenance_score_threshold: 75.0,
            compliance_tiers: vec![(10.0, 500.0), (5.0, 200.0)],
            product_loss_recapture: 0.8,
            energy_recapture: 0.7,
            maintenance_recapture: 0.6,
        }
    }
}

/// Monthly cost breakdown for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub zone: ZoneId,
    pub product_loss_cost: f64,
    pub energy_waste_cost: f64,
    pub excess_maintenance_cost: f64,
    pub compliance_risk_cost: f64,
    pub total_monthly_cost: f64,
    pub potential_monthly_savings: f64,
    pub performance_score: f64,
}

impl CostEstimate {
    /// Savings as a percentage of cost
    pub fn roi_opportunity_pct(&self) -> f64 {
        roi_pct(self.potential_monthly_savings, self.total_monthly_cost)
    }
}

impl CostModel {
    /// Estimate a zone's monthly cost impact
    ///
    /// `alert_count` and `avg_temperature` cover the whole evaluated stream,
    /// while `score` covers its trailing window.
    pub fn estimate(
        &self,
        zone: ZoneId,
        score: &ZoneScore,
        alert_count: usize,
        avg_temperature: f64,
    ) -> CostEstimate {
        let profile = zone.profile();

        let product_loss_cost = alert_count as f64 * profile.loss_per_alert;

        let deviation = if avg_temperature.is_finite() {
            (avg_temperature - profile.optimal_temperature()).abs()
        } else {
            0.0
        };
        let waste_fraction = (deviation * self.waste_rate_per_degree).min(self.max_waste_fraction);
        let energy_waste_cost = self.base_energy_cost * waste_fraction;

        let excess_maintenance_cost = if score.total_score >= self.maintenance_score_threshold {
            0.0
        } else {
            let factor = self.maintenance_multiplier * (100.0 - score.total_score) / 100.0;
            (self.base_maintenance_cost * (factor - 1.0)).max(0.0)
        };

        let compliance_risk_cost = self
            .compliance_tiers
            .iter()
            .find(|(above, _)| score.alert_rate_pct > *above)
            .map(|(_, cost)| *cost)
            .unwrap_or(0.0);

        let total_monthly_cost =
            product_loss_cost + energy_waste_cost + excess_maintenance_cost + compliance_risk_cost;
        let potential_monthly_savings = self.product_loss_recapture * product_loss_cost
            + self.energy_recapture * energy_waste_cost
            + self.maintenance_recapture * excess_maintenance_cost;

        CostEstimate {
            zone,
            product_loss_cost,
            energy_waste_cost,
            excess_maintenance_cost,
            compliance_risk_cost,
            total_monthly_cost,
            potential_monthly_savings,
            performance_score: score.total_score,
        }
    }
}

/// System-wide cost totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemCostSummary {
    pub total_monthly_cost: f64,
    pub total_potential_savings: f64,
    pub annual_cost_impact: f64,
    pub annual_savings_potential: f64,
    pub roi_percentage: f64,
    /// Zones by monthly cost, highest first
    pub priorities: Vec<(ZoneId, f64)>,
    /// Zones by potential savings, highest first
    pub quick_wins: Vec<(ZoneId, f64)>,
    /// Savings of the top two quick wins
    pub combined_quick_win_savings: f64,
}

impl SystemCostSummary {
    pub fn from_estimates(estimates: &[CostEstimate]) -> Self {
        let total_monthly_cost: f64 = estimates.iter().map(|e| e.total_monthly_cost).sum();
        let total_potential_savings: f64 =
            estimates.iter().map(|e| e.potential_monthly_savings).sum();

        let mut priorities: Vec<(ZoneId, f64)> = estimates
            .iter()
            .map(|e| (e.zone, e.total_monthly_cost))
            .collect();
        priorities.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut quick_wins: Vec<(ZoneId, f64)> = estimates
            .iter()
            .map(|e| (e.zone, e.potential_monthly_savings))
            .collect();
        quick_wins.sort_by(|a, b| b.1.total_cmp(&a.1));
        let combined_quick_win_savings = quick_wins.iter().take(QUICK_WIN_COUNT).map(|(_, s)| s).sum();

        Self {
            total_monthly_cost,
            total_potential_savings,
            annual_cost_impact: total_monthly_cost * MONTHS_PER_YEAR,
            annual_savings_potential: total_potential_savings * MONTHS_PER_YEAR,
            roi_percentage: roi_pct(total_potential_savings, total_monthly_cost),
            priorities,
            quick_wins,
            combined_quick_win_savings,
        }
    }
}

fn roi_pct(savings: f64, cost: f64) -> f64 {
    savings / cost.max(1.0) * 100.0
}
