//! Bounded random-walk sensor simulation
//!
//! Each zone's temperature and humidity follow a random walk around the
//! zone's optimal band. Occasional simulated equipment faults push a value
//! beyond the band; otherwise values that drifted out are pulled back.

use std::collections::HashMap;
use std::f64::consts::PI;

use chrono::{NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{MonitorError, Result};
use crate::models::Reading;
use crate::scoring::round_to;
use crate::zones::{ZoneId, ZoneProfile};

/// Distance beyond the band past which a stored value is treated as corrupt
const IMPLAUSIBLE_DISTANCE: f64 = 10.0;

/// Humidity change per degree of temperature change
const HUMIDITY_COUPLING: f64 = -2.0;

/// Walk parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DriftConfig {
    /// Largest temperature change per step outside faults
    pub max_temp_drift: f64,
    /// Largest humidity change per step outside faults
    pub max_humidity_drift: f64,
    /// Chance per value of a simulated fault
    pub violation_probability: f64,
    /// Fault offset range beyond the band edge
    pub violation_offset: (f64, f64),
    /// Largest pull-back distance into the band
    pub pull_back: f64,
    /// Amplitude of the time-of-day temperature swing
    pub daily_amplitude: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            max_temp_drift: 1.0,
            max_humidity_drift: 3.0,
            violation_probability: 0.08,
            violation_offset: (0.1, 3.0),
            pull_back: 1.0,
            daily_amplitude: 0.3,
        }
    }
}

impl DriftConfig {
    pub fn with_violation_probability(mut self, probability: f64) -> Self {
        self.violation_probability = probability;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = [
            self.max_temp_drift,
            self.max_humidity_drift,
            self.violation_probability,
            self.violation_offset.0,
            self.violation_offset.1,
            self.pull_back,
            self.daily_amplitude,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(MonitorError::InvalidConfig(
                "drift parameters must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.violation_probability) {
            return Err(MonitorError::InvalidConfig(format!(
                "violation probability {} outside [0, 1]",
                self.violation_probability
            )));
        }
        if self.max_temp_drift < 0.0 || self.max_humidity_drift < 0.0 || self.pull_back < 0.0 {
            return Err(MonitorError::InvalidConfig(
                "drift limits must be non-negative".to_string(),
            ));
        }
        let (low, high) = self.violation_offset;
        if low < 0.0 || low > high {
            return Err(MonitorError::InvalidConfig(format!(
                "violation offset range [{low}, {high}] is invalid"
            )));
        }
        Ok(())
    }
}

/// Last known values for a zone, repaired if implausible
///
/// Non-finite temperatures, or ones more than ten units outside the band,
/// reset to the band midpoint. Humidity outside [0, 100] or absent resets
/// likewise.
pub fn sanitize_previous(profile: &ZoneProfile, reading: &Reading) -> (f64, f64) {
    let t = reading.temperature;
    let temperature = if t.is_finite()
        && t >= profile.temp_min - IMPLAUSIBLE_DISTANCE
        && t <= profile.temp_max + IMPLAUSIBLE_DISTANCE
    {
        t
    } else {
        profile.optimal_temperature()
    };

    let humidity = match reading.humidity {
        Some(h) if h.is_finite() && (0.0..=100.0).contains(&h) => h,
        _ => profile.optimal_humidity(),
    };

    (temperature, humidity)
}

/// Time-of-day temperature bias
pub fn daily_variation(at: NaiveDateTime, amplitude: f64) -> f64 {
    (at.hour() as f64 / 24.0 * 2.0 * PI).sin() * amplitude
}

/// Synthetic reading source
pub struct ReadingGenerator<R: Rng = StdRng> {
    rng: R,
    config: DriftConfig,
}

impl ReadingGenerator<StdRng> {
    /// Deterministic generator for replayable runs
    pub fn seeded(seed: u64, config: DriftConfig) -> Result<Self> {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }

    pub fn from_os_rng(config: DriftConfig) -> Result<Self> {
        Self::with_rng(StdRng::from_os_rng(), config)
    }
}

impl<R: Rng> ReadingGenerator<R> {
    pub fn with_rng(rng: R, config: DriftConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { rng, config })
    }

    /// Next reading for a zone at instant `at`
    ///
    /// Both temperature and humidity of the result are always finite.
    pub fn next_reading(
        &mut self,
        zone: ZoneId,
        previous: Option<&Reading>,
        at: NaiveDateTime,
    ) -> Reading {
        let profile = zone.profile();
        let previous = previous.map(|r| sanitize_previous(profile, r));

        let walked = self.step(
            previous.map(|(t, _)| t),
            profile.temp_min,
            profile.temp_max,
            self.config.max_temp_drift,
        );
        let temperature = walked + daily_variation(at, self.config.daily_amplitude);

        let coupling = previous
            .map(|(t, _)| HUMIDITY_COUPLING * (temperature - t))
            .unwrap_or(0.0);
        let humidity = self.step(
            previous.map(|(_, h)| h),
            profile.humidity_min,
            profile.humidity_max,
            self.config.max_humidity_drift,
        ) + coupling;

        let temperature = round_to(temperature.clamp(profile.safety_min, profile.safety_max), 2);
        let humidity = round_to(humidity.clamp(0.0, 100.0), 2);

        Reading::new(zone, at, temperature, Some(humidity))
    }

    /// One reading per zone, continuing from each zone's previous reading
    pub fn next_batch(
        &mut self,
        previous: &HashMap<ZoneId, Reading>,
        at: NaiveDateTime,
    ) -> Vec<Reading> {
        ZoneId::ALL
            .iter()
            .map(|zone| self.next_reading(*zone, previous.get(zone), at))
            .collect()
    }

    fn step(&mut self, current: Option<f64>, min: f64, max: f64, max_drift: f64) -> f64 {
        let Some(current) = current else {
            return self.rng.random_range(min..=max);
        };

        let walked = current + self.noise(max_drift);

        if self.rng.random::<f64>() < self.config.violation_probability {
            let (low, high) = self.config.violation_offset;
            let offset = self.rng.random_range(low..=high);
            return if self.rng.random_bool(0.5) {
                min - offset
            } else {
                max + offset
            };
        }

        let target = if walked < min {
            min + self.rng.random_range(0.0..=self.config.pull_back)
        } else if walked > max {
            max - self.rng.random_range(0.0..=self.config.pull_back)
        } else {
            walked
        };

        current + (target - current).clamp(-max_drift, max_drift)
    }

    fn noise(&mut self, max_drift: f64) -> f64 {
        match Normal::new(0.0, max_drift * 0.3) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Midnight, where the daily swing is zero
    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn calm() -> DriftConfig {
        DriftConfig::default().with_violation_probability(0.0)
    }

    #[test]
    fn test_first_reading_starts_in_band() {
        let mut gen = ReadingGenerator::seeded(7, calm()).unwrap();
        for zone in ZoneId::ALL {
            let profile = zone.profile();
            let r = gen.next_reading(zone, None, midnight());
            assert!(r.temperature >= profile.temp_min && r.temperature <= profile.temp_max);
            let h = r.humidity.unwrap();
            assert!(h >= profile.humidity_min && h <= profile.humidity_max);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = ReadingGenerator::seeded(42, DriftConfig::default()).unwrap();
        let mut b = ReadingGenerator::seeded(42, DriftConfig::default()).unwrap();
        let mut prev_a = HashMap::new();
        let mut prev_b = HashMap::new();
        for i in 0..50 {
            let at = midnight() + chrono::Duration::seconds(10 * i);
            let batch_a = a.next_batch(&prev_a, at);
            let batch_b = b.next_batch(&prev_b, at);
            assert_eq!(batch_a, batch_b);
            for r in batch_a {
                prev_a.insert(r.zone, r);
            }
            for r in batch_b {
                prev_b.insert(r.zone, r);
            }
        }
    }

    #[test]
    fn test_calm_walk_respects_drift_limit() {
        let mut gen = ReadingGenerator::seeded(3, calm()).unwrap();
        let mut previous = gen.next_reading(ZoneId::Chiller, None, midnight());
        for _ in 0..500 {
            let next = gen.next_reading(ZoneId::Chiller, Some(&previous), midnight());
            // rounding adds at most half a hundredth
            assert!((next.temperature - previous.temperature).abs() <= 1.0 + 0.006);
            previous = next;
        }
    }

    #[test]
    fn test_faults_land_beyond_the_band() {
        let config = DriftConfig::default().with_violation_probability(1.0);
        let mut gen = ReadingGenerator::seeded(11, config).unwrap();
        let profile = ZoneId::Freezer.profile();
        let start = Reading::new(ZoneId::Freezer, midnight(), -20.0, Some(60.0));
        for _ in 0..200 {
            let r = gen.next_reading(ZoneId::Freezer, Some(&start), midnight());
            let below = profile.temp_min - r.temperature;
            let above = r.temperature - profile.temp_max;
            let distance = below.max(above);
            assert!(distance >= 0.1 - 0.006 && distance <= 3.0 + 0.006, "{}", r.temperature);
        }
    }

    #[test]
    fn test_output_always_finite_and_clamped() {
        let mut gen = ReadingGenerator::seeded(99, DriftConfig::default().with_violation_probability(0.5)).unwrap();
        let corrupt = Reading::new(ZoneId::Pharma, midnight(), f64::NAN, Some(f64::INFINITY));
        let mut previous = gen.next_reading(ZoneId::Pharma, Some(&corrupt), midnight());
        for i in 0..2_000 {
            let at = midnight() + chrono::Duration::minutes(i);
            let r = gen.next_reading(ZoneId::Pharma, Some(&previous), at);
            assert!(r.temperature.is_finite());
            let h = r.humidity.unwrap();
            assert!(h.is_finite() && (0.0..=100.0).contains(&h));
            assert!(r.temperature >= -10.0 && r.temperature <= 25.0);
            previous = r;
        }
    }

    #[test]
    fn test_sanitize_resets_implausible_values() {
        let profile = ZoneId::Freezer.profile();
        let far = Reading::new(ZoneId::Freezer, midnight(), 5.0, Some(140.0));
        assert_eq!(sanitize_previous(profile, &far), (-20.0, 60.0));

        let fine = Reading::new(ZoneId::Freezer, midnight(), -27.5, Some(0.0));
        assert_eq!(sanitize_previous(profile, &fine), (-27.5, 0.0));

        let missing = Reading::new(ZoneId::Freezer, midnight(), -19.0, None);
        assert_eq!(sanitize_previous(profile, &missing), (-19.0, 60.0));
    }

    #[test]
    fn test_daily_variation_cycle() {
        let six_am = midnight() + chrono::Duration::hours(6);
        assert_eq!(daily_variation(midnight(), 0.3), 0.0);
        assert!((daily_variation(six_am, 0.3) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let err = ReadingGenerator::seeded(1, DriftConfig::default().with_violation_probability(1.5))
            .err()
            .unwrap();
        assert!(matches!(err, MonitorError::InvalidConfig(_)));
    }

    #[test]
    fn test_batch_covers_every_zone() {
        let mut gen = ReadingGenerator::seeded(5, DriftConfig::default()).unwrap();
        let batch = gen.next_batch(&HashMap::new(), midnight());
        let zones: Vec<ZoneId> = batch.iter().map(|r| r.zone).collect();
        assert_eq!(zones, ZoneId::ALL.to_vec());
        assert!(batch.iter().all(|r| r.timestamp == midnight()));
    }
}
