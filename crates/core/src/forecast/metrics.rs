/// Mean absolute percentage error, in percent. Periods whose actual value is zero
/// are skipped; `None` when no period remains.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();

    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().sum::<f64>() / errors.len() as f64 * 100.0)
}

/// Half-width of the interval relative to the point forecast, in percent.
/// `None` for a zero forecast.
pub fn error_margin_pct(lower: f64, upper: f64, predicted: f64) -> Option<f64> {
    let margin = (upper - lower) * 100.0 / (2.0 * predicted.abs());
    margin.is_finite().then_some(margin)
}

#[cfg(test)]
mod tests {
    use super::{error_margin_pct, mape};

    #[test]
    fn mape_skips_zero_actuals() {
        let value = mape(&[100.0, 0.0, 50.0], &[90.0, 10.0, 60.0]).expect("two usable periods");
        assert!((value - 15.0).abs() < 1e-9);
        assert_eq!(mape(&[0.0, 0.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn margin_is_half_width_over_forecast() {
        assert_eq!(error_margin_pct(80.0, 120.0, 100.0), Some(20.0));
        assert_eq!(error_margin_pct(-5.0, 5.0, 0.0), None);
        assert_eq!(error_margin_pct(100.0, 100.0, 100.0), Some(0.0));
    }
}
