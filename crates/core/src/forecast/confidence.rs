//! Normal-approximation prediction intervals.

/// Point forecast with symmetric bounds at a fixed confidence level.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastWithConfidence {
    pub forecast: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub confidence_level: f64,
}

impl ForecastWithConfidence {
    pub fn from_standard_errors(
        forecast: Vec<f64>,
        std_errors: &[f64],
        confidence_level: f64,
    ) -> Self {
        let z = z_score(confidence_level);

        let lower = forecast.iter().zip(std_errors).map(|(&f, &se)| f - z * se).collect();
        let upper = forecast.iter().zip(std_errors).map(|(&f, &se)| f + z * se).collect();

        Self { forecast, lower, upper, confidence_level }
    }

    pub fn len(&self) -> usize {
        self.forecast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forecast.is_empty()
    }
}

/// Two-sided critical value for the supported confidence levels; anything lower
/// than 0.80 uses the 80% value.
pub fn z_score(confidence_level: f64) -> f64 {
    match confidence_level {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        _ => 1.282,
    }
}
