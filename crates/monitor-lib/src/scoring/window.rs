//! Summary statistics over a window of temperatures

/// Mean and spread of a temperature window
///
/// Uses sample variance (Bessel's correction). Windows with fewer than two
/// values report zero spread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl WindowStats {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                variance: 0.0,
                std_dev: 0.0,
            };
        }

        let mean = values.iter().sum::<f64>() / count as f64;

        // Two-pass for stability
        let variance = if count > 1 {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64
        } else {
            0.0
        };

        Self {
            count,
            mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}
