//! ARIMA(p, d, q) fitted by conditional sum of squares.
//!
//! The series is differenced `d` times, optionally demeaned, and the ARMA
//! coefficients are chosen to minimize the sum of squared one-step residuals.
//! Coefficients are searched through `tanh`, which keeps each one inside
//! (-1, 1), so first-order models stay stationary and invertible.

use thiserror::Error;

use super::confidence::ForecastWithConfidence;
use super::optimizer::{NelderMead, OptimizeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub include_mean: bool,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize, include_mean: bool) -> Self {
        Self { p, d, q, include_mean }
    }

    /// Observations needed after differencing.
    pub fn min_observations(&self) -> usize {
        self.p + self.q + usize::from(self.include_mean) + 2
    }
}

/// Short-horizon backtest model: MA(1) around a constant level.
pub const BACKTEST_ORDER: ArimaOrder = ArimaOrder::new(0, 0, 1, true);
/// Future projection model: ARIMA(1,1,1) without drift.
pub const FUTURE_ORDER: ArimaOrder = ArimaOrder::new(1, 1, 1, false);

#[derive(Clone, Debug, Error, PartialEq)]
pub enum FitError {
    #[error("need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("series contains non-finite values")]
    NonFiniteInput,
    #[error("model fit failed: {0}")]
    Optimizer(#[from] OptimizeError),
}

#[derive(Clone, Debug)]
pub struct ArimaModel {
    order: ArimaOrder,
    mean: f64,
    phi: Vec<f64>,
    theta: Vec<f64>,
    sigma2: f64,
    /// Last value of each differencing level, level 0 first.
    level_tails: Vec<f64>,
    /// Demeaned differenced series.
    centered: Vec<f64>,
    residuals: Vec<f64>,
}

impl ArimaModel {
    pub fn fit(series: &[f64], order: ArimaOrder, optimizer: &NelderMead) -> Result<Self, FitError> {
        if series.iter().any(|value| !value.is_finite()) {
            return Err(FitError::NonFiniteInput);
        }

        let mut levels = vec![series.to_vec()];
        for _ in 0..order.d {
            let next: Vec<f64> = levels
                .last()
                .map(|previous| previous.windows(2).map(|pair| pair[1] - pair[0]).collect())
                .unwrap_or_default();
            levels.push(next);
        }
        let differenced = levels.pop().unwrap_or_default();

        let required = order.min_observations();
        if differenced.len() < required {
            return Err(FitError::InsufficientData {
                required: required + order.d,
                actual: series.len(),
            });
        }
        let level_tails = levels.iter().filter_map(|level| level.last().copied()).collect();

        let start = starting_point(&differenced, order);
        let minimum = optimizer.minimize(|params| css(&differenced, order, params).0, &start)?;

        let (sum_of_squares, residuals) = css(&differenced, order, &minimum.point);
        let (mean, phi, theta) = unpack(order, &minimum.point);
        let effective = (differenced.len() - order.p) as f64;
        let centered = differenced.iter().map(|value| value - mean).collect();

        Ok(Self {
            order,
            mean,
            phi,
            theta,
            sigma2: sum_of_squares / effective,
            level_tails,
            centered,
            residuals,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.phi
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.theta
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Point forecasts on the original scale.
    pub fn predict(&self, horizon: usize) -> Vec<f64> {
        let n = self.centered.len();
        let mut z = self.centered.clone();
        let mut e = self.residuals.clone();

        for _ in 0..horizon {
            let t = z.len();
            let ar: f64 = self.phi.iter().enumerate().map(|(k, phi)| phi * z[t - 1 - k]).sum();
            let ma: f64 = self
                .theta
                .iter()
                .enumerate()
                .map(|(k, theta)| theta * e.get(t - 1 - k).copied().unwrap_or(0.0))
                .sum();
            z.push(ar + ma);
            e.push(0.0);
        }

        let mut forecast: Vec<f64> = z[n..].iter().map(|value| value + self.mean).collect();
        for tail in self.level_tails.iter().rev() {
            let mut running = *tail;
            for value in forecast.iter_mut() {
                running += *value;
                *value = running;
            }
        }
        forecast
    }

    /// Forecast standard errors from the integrated psi weights.
    pub fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        let mut psi = vec![0.0; horizon];
        if let Some(first) = psi.first_mut() {
            *first = 1.0;
        }
        for j in 1..horizon {
            let ma = self.theta.get(j - 1).copied().unwrap_or(0.0);
            let ar: f64 = self
                .phi
                .iter()
                .enumerate()
                .filter(|(k, _)| *k < j)
                .map(|(k, phi)| phi * psi[j - 1 - k])
                .sum();
            psi[j] = ma + ar;
        }
        for _ in 0..self.order.d {
            let mut running = 0.0;
            for weight in psi.iter_mut() {
                running += *weight;
                *weight = running;
            }
        }

        let mut cumulative = 0.0;
        psi.iter()
            .map(|weight| {
                cumulative += weight * weight;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect()
    }

    pub fn forecast(&self, horizon: usize, confidence_level: f64) -> ForecastWithConfidence {
        ForecastWithConfidence::from_standard_errors(
            self.predict(horizon),
            &self.standard_errors(horizon),
            confidence_level,
        )
    }
}

fn starting_point(differenced: &[f64], order: ArimaOrder) -> Vec<f64> {
    let mut start = Vec::with_capacity(usize::from(order.include_mean) + order.p + order.q);
    if order.include_mean {
        start.push(differenced.iter().sum::<f64>() / differenced.len() as f64);
    }
    start.extend(std::iter::repeat(0.0).take(order.p + order.q));
    start
}

fn unpack(order: ArimaOrder, params: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
    let offset = usize::from(order.include_mean);
    let mean = if order.include_mean { params[0] } else { 0.0 };
    let phi = params[offset..offset + order.p].iter().map(|u| u.tanh()).collect();
    let theta = params[offset + order.p..].iter().map(|v| v.tanh()).collect();
    (mean, phi, theta)
}

/// Sum of squared residuals for `params`, conditioning on the first `p` observations.
fn css(differenced: &[f64], order: ArimaOrder, params: &[f64]) -> (f64, Vec<f64>) {
    let (mean, phi, theta) = unpack(order, params);
    let z: Vec<f64> = differenced.iter().map(|value| value - mean).collect();
    let mut residuals = vec![0.0; z.len()];
    let mut sum_of_squares = 0.0;

    for t in order.p..z.len() {
        let ar: f64 = phi.iter().enumerate().map(|(k, phi)| phi * z[t - 1 - k]).sum();
        let ma: f64 = theta
            .iter()
            .enumerate()
            .filter(|(k, _)| *k < t)
            .map(|(k, theta)| theta * residuals[t - 1 - k])
            .sum();
        let residual = z[t] - ar - ma;
        residuals[t] = residual;
        sum_of_squares += residual * residual;
    }

    (sum_of_squares, residuals)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ArimaModel, ArimaOrder, FitError, BACKTEST_ORDER, FUTURE_ORDER};
    use crate::forecast::optimizer::NelderMead;

    fn optimizer() -> NelderMead {
        NelderMead::new(5_000, Duration::from_secs(5))
    }

    /// Deterministic pseudo-noise in [-1, 1).
    fn noise(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn constant_series_has_flat_forecast_and_zero_width_band() {
        let series = vec![100.0; 9];
        let model = ArimaModel::fit(&series, BACKTEST_ORDER, &optimizer()).expect("constant fits");
        let band = model.forecast(3, 0.95);

        for index in 0..3 {
            assert!((band.forecast[index] - 100.0).abs() < 1e-4);
            assert!(band.upper[index] - band.lower[index] < 1e-3);
        }
    }

    #[test]
    fn differenced_model_continues_from_last_level() {
        let series: Vec<f64> = (0..24).map(|t| 50.0 + 2.0 * t as f64).collect();
        let model = ArimaModel::fit(&series, FUTURE_ORDER, &optimizer()).expect("trend fits");
        let forecast = model.predict(4);

        assert_eq!(forecast.len(), 4);
        assert!(forecast[0] > series[23]);
        assert!(forecast.windows(2).all(|pair| pair[1] >= pair[0] - 1e-6));
    }

    #[test]
    fn uncertainty_grows_with_horizon_for_integrated_model() {
        let series: Vec<f64> =
            noise(30, 7).iter().enumerate().map(|(t, n)| 200.0 + t as f64 + 15.0 * n).collect();
        let model = ArimaModel::fit(&series, FUTURE_ORDER, &optimizer()).expect("noisy trend fits");
        let errors = model.standard_errors(6);

        assert!(errors[0] > 0.0);
        assert!(errors.windows(2).all(|pair| pair[1] >= pair[0]));
        assert!(model.ar_coefficients()[0].abs() < 1.0);
        assert!(model.ma_coefficients()[0].abs() < 1.0);
    }

    #[test]
    fn ma_model_recovers_level_of_noisy_series() {
        let series: Vec<f64> = noise(40, 11).iter().map(|n| 500.0 + 20.0 * n).collect();
        let model = ArimaModel::fit(&series, BACKTEST_ORDER, &optimizer()).expect("ma(1) fits");

        assert!((model.mean() - 500.0).abs() < 10.0);
        let forecast = model.predict(5);
        assert!((forecast[4] - model.mean()).abs() < 1e-9);
    }

    #[test]
    fn short_or_invalid_series_fail_to_fit() {
        assert!(matches!(
            ArimaModel::fit(&[1.0, 2.0, 3.0], FUTURE_ORDER, &optimizer()),
            Err(FitError::InsufficientData { actual: 3, .. })
        ));
        assert_eq!(
            ArimaModel::fit(&[1.0, f64::NAN, 3.0, 4.0, 5.0], ArimaOrder::new(0, 0, 1, true), &optimizer())
                .err(),
            Some(FitError::NonFiniteInput)
        );
    }
}
