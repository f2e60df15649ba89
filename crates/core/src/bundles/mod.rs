//! Bundle recommendations fusing co-purchase frequency with rating similarity.
//!
//! For an anchor item every candidate gets
//! `w_co * co / max_co + w_sim * sim / max_sim`, both terms normalized by the
//! anchor's own row maximum over other items. Candidates whose similarity to the
//! anchor is undefined are left out, and anchors with nothing to normalize
//! against are reported as skipped instead of returning an empty list.

mod co_purchase;

pub use co_purchase::CoPurchaseMatrix;

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::BundleConfig;
use crate::domain::item::ItemName;
use crate::similarity::SimilarityMatrix;

/// Relative weight of each score component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleWeights {
    pub co_purchase: f64,
    pub similarity: f64,
}

pub const DEFAULT_WEIGHTS: BundleWeights = BundleWeights { co_purchase: 0.5, similarity: 0.5 };

/// Upper bound on recommendations per anchor.
pub const MAX_BUNDLES_PER_ITEM: usize = 3;

impl Default for BundleWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BundleRecommendation {
    pub item: ItemName,
    pub recommended_item: ItemName,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No other item was ever bought by the anchor's customers.
    ZeroCoPurchase,
    /// Similarity to every other item is undefined.
    NoDefinedSimilarity,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZeroCoPurchase => "zero_co_purchase",
            Self::NoDefinedSimilarity => "no_defined_similarity",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnchorOutcome {
    Recommended(Vec<BundleRecommendation>),
    Skipped { reason: SkipReason },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedAnchor {
    pub item: ItemName,
    pub reason: SkipReason,
}

/// Per-anchor outcomes in item order; partial success is inspectable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BundleBatch {
    anchors: Vec<(ItemName, AnchorOutcome)>,
}

impl BundleBatch {
    pub fn anchors(&self) -> &[(ItemName, AnchorOutcome)] {
        &self.anchors
    }

    pub fn outcome(&self, item: &ItemName) -> Option<&AnchorOutcome> {
        self.anchors.iter().find(|(anchor, _)| anchor == item).map(|(_, outcome)| outcome)
    }

    pub fn recommendations(&self) -> Vec<&BundleRecommendation> {
        self.anchors
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                AnchorOutcome::Recommended(list) => Some(list.iter()),
                AnchorOutcome::Skipped { .. } => None,
            })
            .flatten()
            .collect()
    }

    pub fn skipped(&self) -> Vec<SkippedAnchor> {
        self.anchors
            .iter()
            .filter_map(|(item, outcome)| match outcome {
                AnchorOutcome::Skipped { reason } => {
                    Some(SkippedAnchor { item: item.clone(), reason: *reason })
                }
                AnchorOutcome::Recommended(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BundleRecommender {
    weights: BundleWeights,
    max_per_item: usize,
}

impl Default for BundleRecommender {
    fn default() -> Self {
        Self { weights: DEFAULT_WEIGHTS, max_per_item: MAX_BUNDLES_PER_ITEM }
    }
}

impl BundleRecommender {
    pub fn new(config: BundleConfig) -> Self {
        Self {
            weights: BundleWeights {
                co_purchase: config.co_purchase_weight,
                similarity: config.similarity_weight,
            },
            max_per_item: config.max_per_item.min(MAX_BUNDLES_PER_ITEM),
        }
    }

    pub fn with_weights(weights: BundleWeights) -> Self {
        Self { weights, ..Self::default() }
    }

    /// Every anchor in the co-purchase matrix, evaluated independently.
    pub fn recommend_all(
        &self,
        co_purchase: &CoPurchaseMatrix,
        similarity: &SimilarityMatrix,
    ) -> BundleBatch {
        let anchors = co_purchase
            .items()
            .par_iter()
            .map(|anchor| (anchor.clone(), self.recommend(anchor, co_purchase, similarity)))
            .collect();
        BundleBatch { anchors }
    }

    pub fn recommend(
        &self,
        anchor: &ItemName,
        co_purchase: &CoPurchaseMatrix,
        similarity: &SimilarityMatrix,
    ) -> AnchorOutcome {
        let co_row: Vec<(&ItemName, u32)> = co_purchase
            .row(anchor)
            .map(|row| row.filter(|(other, _)| *other != anchor).collect())
            .unwrap_or_default();
        let max_co = co_row.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if max_co == 0 {
            return AnchorOutcome::Skipped { reason: SkipReason::ZeroCoPurchase };
        }

        let candidates: Vec<(&ItemName, u32, f64)> = co_row
            .iter()
            .filter_map(|(other, count)| {
                let value = similarity.get(anchor, other)?.value()?;
                Some((*other, *count, value))
            })
            .collect();
        if candidates.is_empty() {
            return AnchorOutcome::Skipped { reason: SkipReason::NoDefinedSimilarity };
        }

        let max_similarity =
            candidates.iter().map(|(_, _, value)| *value).fold(f64::NEG_INFINITY, f64::max);

        let mut scored: Vec<(&ItemName, f64)> = candidates
            .into_iter()
            .map(|(other, count, value)| {
                let co_term = f64::from(count) / f64::from(max_co);
                let similarity_term =
                    if max_similarity > 0.0 { (value / max_similarity).max(0.0) } else { 0.0 };
                let score = self.weights.co_purchase * co_term
                    + self.weights.similarity * similarity_term;
                (other, score.clamp(0.0, 1.0))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(b.0))
        });
        scored.truncate(self.max_per_item);

        AnchorOutcome::Recommended(
            scored
                .into_iter()
                .map(|(other, score)| BundleRecommendation {
                    item: anchor.clone(),
                    recommended_item: other.clone(),
                    score: round_score(score),
                })
                .collect(),
        )
    }
}

fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}
