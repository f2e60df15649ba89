//! Per-item sales forecasting on gap-filled monthly series.
//!
//! Backtests hold out the chronologically last share of the series and compare
//! an MA(1) fit against it. Future projections fit ARIMA(1,1,1) on the full
//! history. Both return typed outcomes: insufficient history and failed fits are
//! values the caller inspects, never errors that stop other items.

pub mod arima;
pub mod confidence;
pub mod metrics;
pub mod optimizer;

pub use arima::{ArimaModel, ArimaOrder, FitError, BACKTEST_ORDER, FUTURE_ORDER};
pub use confidence::ForecastWithConfidence;
pub use optimizer::{NelderMead, OptimizeError};

use serde::Serialize;

use crate::aggregate::MonthlySeries;
use crate::config::ForecastConfig;
use crate::domain::item::ItemName;
use crate::domain::month::Month;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    Backtest,
    Future,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObservedPoint {
    pub period: Month,
    pub observed: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestPoint {
    pub period: Month,
    pub observed: f64,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    pub error_margin_pct: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestReport {
    pub item: ItemName,
    pub mode: ForecastMode,
    pub train: Vec<ObservedPoint>,
    pub points: Vec<BacktestPoint>,
    pub mape: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktestOutcome {
    Completed(BacktestReport),
    InsufficientData {
        item: ItemName,
        mode: ForecastMode,
        months_available: usize,
        months_required: usize,
    },
    Failed {
        item: ItemName,
        mode: ForecastMode,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FuturePoint {
    pub period: Month,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FutureReport {
    pub item: ItemName,
    pub mode: ForecastMode,
    pub horizon: usize,
    pub points: Vec<FuturePoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FutureOutcome {
    Completed(FutureReport),
    Failed {
        item: ItemName,
        mode: ForecastMode,
        reason: String,
    },
}

impl BacktestOutcome {
    pub fn item(&self) -> &ItemName {
        match self {
            Self::Completed(report) => &report.item,
            Self::InsufficientData { item, .. } | Self::Failed { item, .. } => item,
        }
    }
}

impl FutureOutcome {
    pub fn item(&self) -> &ItemName {
        match self {
            Self::Completed(report) => &report.item,
            Self::Failed { item, .. } => item,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn optimizer(&self) -> NelderMead {
        NelderMead::new(self.config.max_iterations, self.config.fit_timeout())
    }

    pub fn backtest(&self, item: &ItemName, series: &MonthlySeries) -> BacktestOutcome {
        let months_available = series.len();
        if months_available < self.config.min_backtest_months {
            return BacktestOutcome::InsufficientData {
                item: item.clone(),
                mode: ForecastMode::Backtest,
                months_available,
                months_required: self.config.min_backtest_months,
            };
        }

        let split = (months_available as f64 * self.config.train_fraction).floor() as usize;
        let (train_sales, test_sales) = series.sales.split_at(split);
        let (train_months, test_months) = series.months.split_at(split);

        let model = match ArimaModel::fit(train_sales, BACKTEST_ORDER, &self.optimizer()) {
            Ok(model) => model,
            Err(error) => {
                return BacktestOutcome::Failed {
                    item: item.clone(),
                    mode: ForecastMode::Backtest,
                    reason: error.to_string(),
                }
            }
        };
        let band = model.forecast(test_sales.len(), self.config.confidence_level);

        let points = test_months
            .iter()
            .zip(test_sales)
            .enumerate()
            .map(|(step, (period, observed))| BacktestPoint {
                period: *period,
                observed: *observed,
                predicted: band.forecast[step],
                lower: band.lower[step],
                upper: band.upper[step],
                error_margin_pct: metrics::error_margin_pct(
                    band.lower[step],
                    band.upper[step],
                    band.forecast[step],
                ),
            })
            .collect();

        BacktestOutcome::Completed(BacktestReport {
            item: item.clone(),
            mode: ForecastMode::Backtest,
            train: train_months
                .iter()
                .zip(train_sales)
                .map(|(period, observed)| ObservedPoint { period: *period, observed: *observed })
                .collect(),
            points,
            mape: metrics::mape(test_sales, &band.forecast),
        })
    }

    /// `horizon` is trusted here; range checks belong to the caller.
    pub fn forecast(&self, item: &ItemName, series: &MonthlySeries, horizon: usize) -> FutureOutcome {
        let failed = |reason: String| FutureOutcome::Failed {
            item: item.clone(),
            mode: ForecastMode::Future,
            reason,
        };

        let Some(last_month) = series.last_month() else {
            return failed("item has no sales history".to_string());
        };

        let model = match ArimaModel::fit(&series.sales, FUTURE_ORDER, &self.optimizer()) {
            Ok(model) => model,
            Err(error) => return failed(error.to_string()),
        };
        let band = model.forecast(horizon, self.config.confidence_level);

        let periods = std::iter::successors(Some(last_month.succ()), |month| Some(month.succ()));
        let points = periods
            .zip(band.forecast.iter().zip(band.lower.iter().zip(&band.upper)))
            .map(|(period, (predicted, (lower, upper)))| FuturePoint {
                period,
                predicted: *predicted,
                lower: *lower,
                upper: *upper,
            })
            .collect();

        FutureOutcome::Completed(FutureReport {
            item: item.clone(),
            mode: ForecastMode::Future,
            horizon,
            points,
        })
    }
}
