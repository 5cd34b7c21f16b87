//! Zone and system reports
//!
//! Runs the classify, score, analysis, cost and forecast pipeline over a loaded stream
//! and condenses each zone into a summary with an overall status.

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::alerting::{classify_all, AlertHistory, ClassifiedReading};
use crate::config::ThresholdConfig;
use crate::cost::{CostEstimate, CostModel, SystemCostSummary};
use crate::error::{MonitorError, Result};
use crate::models::{zone_readings, Reading};
use crate::observability::StructuredLogger;
use crate::scoring::{
    PerformanceScorer, ScoreBand, TrendForecast, TrendForecaster, WindowStats, ZoneAnalysis,
    ZoneScore,
};
use crate::zones::ZoneId;

/// Readings considered for the zone status
const STATUS_LOOKBACK: usize = 12;

/// Alerts tolerated in the lookback for a warning status
const WARNING_ALERT_LIMIT: usize = 2;

/// Readings per half of the trend comparison
const TREND_HALF: usize = 5;

/// Score at or above which a zone counts as performing well
const PERFORMING_WELL_SCORE: f64 = 75.0;

/// Traffic-light status of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Optimal,
    Warning,
    Critical,
}

impl ZoneStatus {
    /// Status from the latest temperature and recent alert count
    pub fn evaluate(temperature: f64, recent_alerts: usize, config: &ThresholdConfig) -> Self {
        let buffer = config.warning_buffer();
        let within_buffer = temperature >= config.temp_min() - buffer
            && temperature <= config.temp_max() + buffer;

        if config.temperature_in_band(temperature) && recent_alerts == 0 {
            ZoneStatus::Optimal
        } else if within_buffer && recent_alerts <= WARNING_ALERT_LIMIT {
            ZoneStatus::Warning
        } else {
            ZoneStatus::Critical
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneStatus::Optimal => write!(f, "Optimal"),
            ZoneStatus::Warning => write!(f, "Warning"),
            ZoneStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(MonitorError::InvalidConfig(format!(
                    "date range starts after it ends: {from} > {to}"
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let day = timestamp.date();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }

    pub fn filter(&self, readings: &[Reading]) -> Vec<Reading> {
        readings
            .iter()
            .filter(|r| self.contains(r.timestamp))
            .cloned()
            .collect()
    }
}

/// Condensed view of one zone's stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: ZoneId,
    pub latest_temperature: f64,
    pub latest_humidity: Option<f64>,
    pub latest_timestamp: NaiveDateTime,
    pub avg_temperature: f64,
    pub temp_std_dev: f64,
    /// Mean of the last five readings minus the mean of the five before
    pub trend: Option<f64>,
    pub alert_count: usize,
    /// Alerts within the last twelve readings
    pub recent_alert_count: usize,
    pub data_points: usize,
    pub alert_rate_pct: f64,
    pub status: ZoneStatus,
    pub score: Option<f64>,
    pub band: Option<ScoreBand>,
}

impl ZoneSummary {
    /// Summarize a zone's classified stream; `None` when it is empty
    pub fn from_stream(
        zone: ZoneId,
        classified: &[ClassifiedReading],
        config: &ThresholdConfig,
        score: Option<&ZoneScore>,
    ) -> Option<Self> {
        let latest = classified.last()?;
        let temps: Vec<f64> = classified.iter().map(|c| c.reading.temperature).collect();
        let stats = WindowStats::from_values(&temps);

        let alert_count = classified.iter().filter(|c| c.alert_flag).count();
        let recent_start = classified.len().saturating_sub(STATUS_LOOKBACK);
        let recent_alert_count = classified[recent_start..]
            .iter()
            .filter(|c| c.alert_flag)
            .count();

        Some(Self {
            zone,
            latest_temperature: latest.reading.temperature,
            latest_humidity: latest.reading.humidity,
            latest_timestamp: latest.reading.timestamp,
            avg_temperature: stats.mean,
            temp_std_dev: stats.std_dev,
            trend: trend(&temps),
            alert_count,
            recent_alert_count,
            data_points: classified.len(),
            alert_rate_pct: alert_count as f64 / classified.len() as f64 * 100.0,
            status: ZoneStatus::evaluate(latest.reading.temperature, recent_alert_count, config),
            score: score.map(|s| s.total_score),
            band: score.map(|s| s.band()),
        })
    }
}

fn trend(temps: &[f64]) -> Option<f64> {
    if temps.len() < 2 * TREND_HALF {
        return None;
    }
    let n = temps.len();
    let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;
    let recent = mean(&temps[n - TREND_HALF..]);
    let earlier = mean(&temps[n - 2 * TREND_HALF..n - TREND_HALF]);
    Some(recent - earlier)
}

/// Everything computed for one zone
#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub zone: ZoneId,
    pub config: ThresholdConfig,
    pub classified: Vec<ClassifiedReading>,
    pub summary: Option<ZoneSummary>,
    pub score: Option<ZoneScore>,
    pub analysis: Option<ZoneAnalysis>,
    pub cost: Option<CostEstimate>,
    pub forecast: Option<TrendForecast>,
    pub history: AlertHistory,
}

/// Reports for every zone plus system totals
#[derive(Debug, Clone, Serialize)]
pub struct SystemReport {
    pub generated_at: NaiveDateTime,
    pub zones: Vec<ZoneReport>,
    /// Mean total score across scored zones
    pub average_score: Option<f64>,
    /// Zones scoring at least 75
    pub zones_performing_well: usize,
    pub costs: SystemCostSummary,
}

impl SystemReport {
    pub fn zone(&self, zone: ZoneId) -> Option<&ZoneReport> {
        self.zones.iter().find(|r| r.zone == zone)
    }
}

/// Runs the reporting pipeline with per-zone thresholds
pub struct Analyzer {
    thresholds: HashMap<ZoneId, ThresholdConfig>,
    scorer: PerformanceScorer,
    cost_model: CostModel,
    forecaster: TrendForecaster,
    logger: StructuredLogger,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Analyzer using each zone's default thresholds
    pub fn new() -> Self {
        Self {
            thresholds: ZoneId::ALL
                .iter()
                .map(|zone| (*zone, ThresholdConfig::for_zone(*zone)))
                .collect(),
            scorer: PerformanceScorer::default(),
            cost_model: CostModel::default(),
            forecaster: TrendForecaster::default(),
            logger: StructuredLogger::new("coldstore"),
        }
    }

    pub fn with_threshold(mut self, zone: ZoneId, config: ThresholdConfig) -> Self {
        self.thresholds.insert(zone, config);
        self
    }

    pub fn threshold(&self, zone: ZoneId) -> ThresholdConfig {
        self.thresholds
            .get(&zone)
            .cloned()
            .unwrap_or_else(|| ThresholdConfig::for_zone(zone))
    }

    /// Report for one zone from a mixed stream
    ///
    /// A zone without readings yields a report with no score, summary or
    /// cost; any other scoring failure is returned.
    pub fn zone_report(
        &self,
        zone: ZoneId,
        readings: &[Reading],
        now: NaiveDateTime,
    ) -> Result<ZoneReport> {
        let config = self.threshold(zone);
        let own = zone_readings(readings, zone);
        let classified = classify_all(&own, &config)?;

        let score = match self.scorer.score(zone, &classified, &config, now) {
            Ok(score) => {
                self.logger.log_zone_score(&score);
                Some(score)
            }
            Err(MonitorError::EmptyWindow { .. }) => None,
            Err(e) => return Err(e),
        };

        let analysis = match ZoneAnalysis::analyze(zone, &classified, &config) {
            Ok(analysis) => Some(analysis),
            Err(MonitorError::EmptyWindow { .. }) => None,
            Err(e) => return Err(e),
        };
        let summary = ZoneSummary::from_stream(zone, &classified, &config, score.as_ref());
        let cost = match (&score, &summary) {
            (Some(score), Some(summary)) => Some(self.cost_model.estimate(
                zone,
                score,
                summary.alert_count,
                summary.avg_temperature,
            )),
            _ => None,
        };
        let forecast = self.forecaster.forecast(zone, &own, &config);
        let history = AlertHistory::from_stream(&classified, now);

        Ok(ZoneReport {
            zone,
            config,
            classified,
            summary,
            score,
            analysis,
            cost,
            forecast,
            history,
        })
    }

    /// Reports for all zones and system totals
    pub fn system_report(&self, readings: &[Reading], now: NaiveDateTime) -> Result<SystemReport> {
        let zones = ZoneId::ALL
            .iter()
            .map(|zone| self.zone_report(*zone, readings, now))
            .collect::<Result<Vec<_>>>()?;

        let scores: Vec<f64> = zones
            .iter()
            .filter_map(|r| r.score.as_ref().map(|s| s.total_score))
            .collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        let zones_performing_well = scores.iter().filter(|s| **s >= PERFORMING_WELL_SCORE).count();

        let estimates: Vec<CostEstimate> = zones.iter().filter_map(|r| r.cost.clone()).collect();

        Ok(SystemReport {
            generated_at: now,
            average_score,
            zones_performing_well,
            costs: SystemCostSummary::from_estimates(&estimates),
            zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertSensitivity;
    use crate::models::fixtures::{base_time, series};
    use chrono::Duration;

    fn freezer() -> ThresholdConfig {
        ThresholdConfig::for_zone(ZoneId::Freezer).with_sensitivity(AlertSensitivity::Medium)
    }

    #[test]
    fn test_zone_status_rules() {
        let config = freezer();
        assert_eq!(ZoneStatus::evaluate(-20.0, 0, &config), ZoneStatus::Optimal);
        assert_eq!(ZoneStatus::evaluate(-20.0, 1, &config), ZoneStatus::Warning);
        assert_eq!(ZoneStatus::evaluate(-17.0, 2, &config), ZoneStatus::Warning);
        assert_eq!(ZoneStatus::evaluate(-17.0, 3, &config), ZoneStatus::Critical);
        assert_eq!(ZoneStatus::evaluate(-15.0, 0, &config), ZoneStatus::Critical);
    }

    #[test]
    fn test_date_range_is_inclusive_by_day() {
        let day = base_time().date();
        let range = DateRange::new(Some(day), Some(day)).unwrap();
        assert!(range.contains(base_time()));
        assert!(range.contains(base_time() + Duration::hours(11)));
        assert!(!range.contains(base_time() + Duration::hours(12)));

        let readings = series(ZoneId::Freezer, &[-20.0; 3]);
        assert_eq!(DateRange::default().filter(&readings).len(), 3);
        assert!(DateRange::new(Some(day), day.pred_opt()).is_err());
    }

    #[test]
    fn test_summary_trend_and_counts() {
        let mut temps = vec![-21.0; 5];
        temps.extend(vec![-19.0; 5]);
        let classified = classify_all(&series(ZoneId::Freezer, &temps), &freezer()).unwrap();
        let summary = ZoneSummary::from_stream(ZoneId::Freezer, &classified, &freezer(), None).unwrap();

        assert_eq!(summary.data_points, 10);
        assert_eq!(summary.trend, Some(2.0));
        assert_eq!(summary.avg_temperature, -20.0);
        assert_eq!(summary.status, ZoneStatus::Optimal);
        assert_eq!(summary.latest_timestamp, base_time() + Duration::minutes(9));
        assert!(summary.score.is_none());
    }

    #[test]
    fn test_summary_needs_ten_readings_for_trend() {
        let classified = classify_all(&series(ZoneId::Freezer, &[-20.0; 9]), &freezer()).unwrap();
        let summary = ZoneSummary::from_stream(ZoneId::Freezer, &classified, &freezer(), None).unwrap();
        assert_eq!(summary.trend, None);
        assert!(ZoneSummary::from_stream(ZoneId::Freezer, &[], &freezer(), None).is_none());
    }

    #[test]
    fn test_recent_alerts_only_look_back_twelve() {
        let mut temps = vec![-30.0; 5];
        temps.extend(vec![-20.0; 12]);
        let classified = classify_all(&series(ZoneId::Freezer, &temps), &freezer()).unwrap();
        let summary = ZoneSummary::from_stream(ZoneId::Freezer, &classified, &freezer(), None).unwrap();
        assert_eq!(summary.alert_count, 5);
        assert_eq!(summary.recent_alert_count, 0);
        assert_eq!(summary.status, ZoneStatus::Optimal);
    }

    #[test]
    fn test_zone_without_readings_has_no_score() {
        let readings = series(ZoneId::Freezer, &[-20.0; 5]);
        let report = Analyzer::new()
            .zone_report(ZoneId::Pharma, &readings, base_time())
            .unwrap();
        assert!(report.score.is_none());
        assert!(report.summary.is_none());
        assert!(report.analysis.is_none());
        assert!(report.cost.is_none());
        assert_eq!(report.history.total_alerts, 0);
    }

    #[test]
    fn test_system_report() {
        let mut readings = series(ZoneId::Freezer, &[-20.0; 20]);
        readings.extend(series(ZoneId::Pharma, &[12.0; 20]));
        let now = base_time() + Duration::minutes(20);

        let report = Analyzer::new().system_report(&readings, now).unwrap();
        assert_eq!(report.zones.len(), 4);

        let freezer = report.zone(ZoneId::Freezer).unwrap();
        assert!(freezer.score.as_ref().unwrap().total_score >= 75.0);
        assert_eq!(freezer.cost.as_ref().unwrap().total_monthly_cost, 0.0);

        let pharma = report.zone(ZoneId::Pharma).unwrap();
        assert_eq!(pharma.history.total_alerts, 20);
        assert_eq!(pharma.analysis.as_ref().unwrap().deviation_count, 20);
        assert!(pharma.score.as_ref().unwrap().total_score < 75.0);
        assert_eq!(report.costs.priorities[0].0, ZoneId::Pharma);

        assert_eq!(report.zones_performing_well, 1);
        assert!(report.average_score.is_some());
    }

    #[test]
    fn test_threshold_override_changes_classification() {
        let readings = series(ZoneId::Freezer, &[-17.0; 3]);
        let relaxed = ThresholdConfig::new(-22.0, -16.0, 2.0, 50.0, 70.0, AlertSensitivity::High, 95.0).unwrap();
        let report = Analyzer::new()
            .with_threshold(ZoneId::Freezer, relaxed)
            .zone_report(ZoneId::Freezer, &readings, base_time())
            .unwrap();
        assert_eq!(report.history.total_alerts, 0);
    }
}
