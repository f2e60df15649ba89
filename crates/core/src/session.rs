//! Caller-owned analytics state built from one transaction snapshot.
//!
//! An [`AnalyticsSession`] computes the monthly aggregate, the similarity and
//! co-purchase matrices, and the bundle batch once, then answers item-keyed
//! queries against them. Nothing is global: a new snapshot is applied through
//! [`AnalyticsSession::refresh`], which rebuilds every derived table under a
//! fresh run id.

use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::{MonthlyAggregate, MonthlyRow};
use crate::bundles::{AnchorOutcome, BundleBatch, BundleRecommender, CoPurchaseMatrix};
use crate::config::AnalyticsConfig;
use crate::customers;
use crate::domain::item::ItemName;
use crate::domain::transaction::{Transaction, TransactionTable};
use crate::errors::DomainError;
use crate::forecast::{BacktestOutcome, ForecastEngine, FutureOutcome};
use crate::overview::SalesSummary;
use crate::segmentation::{self, Segmentation};
use crate::similarity::{RatingMatrix, SimilarItem, SimilarityEngine, SimilarityMatrix};
use crate::timing::{self, TimingRow};

pub const DEFAULT_SIMILAR_ITEMS: usize = 5;

#[derive(Debug)]
pub struct AnalyticsSession {
    run_id: Uuid,
    config: AnalyticsConfig,
    table: TransactionTable,
    aggregate: MonthlyAggregate,
    similarity: SimilarityMatrix,
    co_purchase: CoPurchaseMatrix,
    bundles: BundleBatch,
}

impl AnalyticsSession {
    pub fn new(table: TransactionTable, config: AnalyticsConfig) -> Self {
        let run_id = Uuid::new_v4();
        let derived = Derived::build(&table, &config, run_id);
        Self {
            run_id,
            config,
            table,
            aggregate: derived.aggregate,
            similarity: derived.similarity,
            co_purchase: derived.co_purchase,
            bundles: derived.bundles,
        }
    }

    /// Replace the snapshot and recompute every derived table.
    pub fn refresh(&mut self, table: TransactionTable) {
        let run_id = Uuid::new_v4();
        let derived = Derived::build(&table, &self.config, run_id);
        self.run_id = run_id;
        self.table = table;
        self.aggregate = derived.aggregate;
        self.similarity = derived.similarity;
        self.co_purchase = derived.co_purchase;
        self.bundles = derived.bundles;
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    pub fn aggregate(&self) -> &MonthlyAggregate {
        &self.aggregate
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn co_purchase(&self) -> &CoPurchaseMatrix {
        &self.co_purchase
    }

    pub fn bundles(&self) -> &BundleBatch {
        &self.bundles
    }

    /// Canonical name for a free-form query, if it names a vocabulary item.
    pub fn lookup_item(&self, query: &str) -> Option<ItemName> {
        self.table.catalog().canonicalize(query)
    }

    pub fn similar_items(&self, query: &str, top_n: usize) -> Option<Vec<SimilarItem>> {
        let item = self.lookup_item(query)?;
        self.similarity.most_similar(&item, top_n)
    }

    pub fn bundles_for(&self, query: &str) -> Option<&AnchorOutcome> {
        let item = self.lookup_item(query)?;
        self.bundles.outcome(&item)
    }

    /// Observed monthly rows for each recognized item, in query order. Unknown
    /// and repeated queries are ignored.
    pub fn sales_trend<S: AsRef<str>>(&self, queries: &[S]) -> Vec<MonthlyRow> {
        let mut seen: Vec<ItemName> = Vec::new();
        for query in queries {
            if let Some(item) = self.lookup_item(query.as_ref()) {
                if !seen.contains(&item) {
                    seen.push(item);
                }
            }
        }
        seen.iter().flat_map(|item| self.aggregate.rows(item)).collect()
    }

    fn forecast_engine(&self) -> ForecastEngine {
        ForecastEngine::new(self.config.forecast)
    }

    pub fn backtest(&self, query: &str) -> Option<BacktestOutcome> {
        let item = self.lookup_item(query)?;
        let series = self.aggregate.series(&item)?;
        let outcome = self.forecast_engine().backtest(&item, &series);
        self.log_backtest(&outcome);
        Some(outcome)
    }

    pub fn forecast(&self, query: &str, horizon: usize) -> Result<Option<FutureOutcome>, DomainError> {
        self.check_horizon(horizon)?;
        let Some(item) = self.lookup_item(query) else {
            return Ok(None);
        };
        let Some(series) = self.aggregate.series(&item) else {
            return Ok(None);
        };
        let outcome = self.forecast_engine().forecast(&item, &series, horizon);
        self.log_future(&outcome);
        Ok(Some(outcome))
    }

    /// Backtests for every item with sales, alphabetical by item.
    pub fn backtest_all(&self) -> Vec<BacktestOutcome> {
        let engine = self.forecast_engine();
        let items: Vec<&ItemName> = self.aggregate.items().collect();
        let outcomes: Vec<BacktestOutcome> = items
            .par_iter()
            .filter_map(|item| {
                let series = self.aggregate.series(item)?;
                Some(engine.backtest(item, &series))
            })
            .collect();
        outcomes.iter().for_each(|outcome| self.log_backtest(outcome));
        outcomes
    }

    pub fn forecast_all(&self, horizon: usize) -> Result<Vec<FutureOutcome>, DomainError> {
        self.check_horizon(horizon)?;
        let engine = self.forecast_engine();
        let items: Vec<&ItemName> = self.aggregate.items().collect();
        let outcomes: Vec<FutureOutcome> = items
            .par_iter()
            .filter_map(|item| {
                let series = self.aggregate.series(item)?;
                Some(engine.forecast(item, &series, horizon))
            })
            .collect();
        outcomes.iter().for_each(|outcome| self.log_future(outcome));
        Ok(outcomes)
    }

    pub fn segments(&self) -> Segmentation {
        segmentation::segment(&self.table)
    }

    pub fn timing(&self) -> Result<Vec<TimingRow>, DomainError> {
        timing::timing(&self.aggregate)
    }

    pub fn summary(&self) -> SalesSummary {
        SalesSummary::from_table(&self.table)
    }

    pub fn customer_history(&self, customer: &str) -> Vec<&Transaction> {
        customers::purchase_history(&self.table, customer)
    }

    fn check_horizon(&self, horizon: usize) -> Result<(), DomainError> {
        let forecast = &self.config.forecast;
        if (forecast.min_horizon..=forecast.max_horizon).contains(&horizon) {
            Ok(())
        } else {
            Err(DomainError::InvalidHorizon {
                requested: horizon,
                min: forecast.min_horizon,
                max: forecast.max_horizon,
            })
        }
    }

    fn log_backtest(&self, outcome: &BacktestOutcome) {
        match outcome {
            BacktestOutcome::Completed(_) => {}
            BacktestOutcome::InsufficientData { item, months_available, months_required, .. } => {
                info!(
                    event_name = "analytics.forecast.insufficient_data",
                    correlation_id = %self.run_id,
                    item = %item,
                    months_available,
                    months_required,
                    "backtest skipped for short history"
                );
            }
            BacktestOutcome::Failed { item, reason, .. } => {
                warn!(
                    event_name = "analytics.forecast.failed",
                    correlation_id = %self.run_id,
                    item = %item,
                    mode = "backtest",
                    reason = %reason,
                    "forecast model fit failed"
                );
            }
        }
    }

    fn log_future(&self, outcome: &FutureOutcome) {
        if let FutureOutcome::Failed { item, reason, .. } = outcome {
            warn!(
                event_name = "analytics.forecast.failed",
                correlation_id = %self.run_id,
                item = %item,
                mode = "future",
                reason = %reason,
                "forecast model fit failed"
            );
        }
    }
}

struct Derived {
    aggregate: MonthlyAggregate,
    similarity: SimilarityMatrix,
    co_purchase: CoPurchaseMatrix,
    bundles: BundleBatch,
}

impl Derived {
    fn build(table: &TransactionTable, config: &AnalyticsConfig, run_id: Uuid) -> Self {
        info!(
            event_name = "analytics.session.build_started",
            correlation_id = %run_id,
            transactions = table.len(),
            "building analytics session"
        );

        let aggregate = MonthlyAggregate::from_table(table);
        let similarity =
            SimilarityEngine::new(config.similarity).compute(&RatingMatrix::from_table(table));
        debug!(
            event_name = "analytics.similarity.undefined_cells",
            correlation_id = %run_id,
            items = similarity.len(),
            undefined = similarity.undefined_count(),
            "similarity matrix computed"
        );

        let co_purchase = CoPurchaseMatrix::from_table(table);
        let bundles = BundleRecommender::new(config.bundles).recommend_all(&co_purchase, &similarity);
        for skipped in bundles.skipped() {
            warn!(
                event_name = "analytics.bundles.anchor_skipped",
                correlation_id = %run_id,
                item = %skipped.item,
                reason = skipped.reason.as_str(),
                "bundle anchor skipped"
            );
        }

        info!(
            event_name = "analytics.session.build_completed",
            correlation_id = %run_id,
            items = similarity.len(),
            transactions = table.len(),
            bundle_anchors = bundles.anchors().len(),
            "analytics session ready"
        );

        Self { aggregate, similarity, co_purchase, bundles }
    }
}
