//! Zone performance scoring, zone-specific analysis and trend forecasting

mod analysis;
mod forecast;
mod scorer;
mod window;

pub use analysis::{Deviation, DeviationKind, Headline, ZoneAnalysis};
pub use forecast::{MaintenanceAction, RiskLevel, TrendForecast, TrendForecaster};
pub use scorer::{round_to, PerformanceScorer, ScoreBand, ZoneScore, DEFAULT_WINDOW_SIZE};
pub use window::WindowStats;
