pub mod aggregate;
pub mod bundles;
pub mod config;
pub mod customers;
pub mod domain;
pub mod errors;
pub mod forecast;
pub mod overview;
pub mod segmentation;
pub mod session;
pub mod similarity;
pub mod store;
pub mod timing;

pub use aggregate::{MonthlyAggregate, MonthlyRow, MonthlySales, MonthlySeries};
pub use bundles::{
    AnchorOutcome, BundleBatch, BundleRecommendation, BundleRecommender, BundleWeights,
    CoPurchaseMatrix, SkipReason, SkippedAnchor,
};
pub use config::{AnalyticsConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use customers::ReviewPoint;
pub use domain::item::{ItemCatalog, ItemName};
pub use domain::month::Month;
pub use domain::transaction::{
    CustomerId, IngestReport, PaymentMethod, Transaction, TransactionRecord, TransactionTable,
};
pub use errors::{AnalyticsError, DomainError, IngestError};
pub use forecast::{
    BacktestOutcome, BacktestReport, ForecastEngine, ForecastMode, FutureOutcome, FutureReport,
};
pub use overview::SalesSummary;
pub use segmentation::{ReviewBucket, SegmentRow, Segmentation};
pub use session::AnalyticsSession;
pub use similarity::{RatingMatrix, SimilarItem, Similarity, SimilarityEngine, SimilarityMatrix};
pub use store::TransactionStore;
pub use timing::TimingRow;
