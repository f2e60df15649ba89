//! Item-item similarity over mean-centered review ratings.
//!
//! Each pair of items is compared only over the customers who rated both
//! (pairwise-complete case). Pairs without enough shared raters, or whose
//! centered vectors have zero length, stay [`Similarity::Undefined`]; they are
//! never reported as zero.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::SimilarityConfig;
use crate::domain::item::ItemName;
use crate::domain::transaction::{CustomerId, TransactionTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndefinedReason {
    /// Fewer shared raters than the configured minimum.
    InsufficientSupport { shared: usize },
    /// Every shared rating sits exactly on an item mean.
    ZeroVariance,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Similarity {
    Defined(f64),
    Undefined(UndefinedReason),
}

impl Similarity {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(value),
            Self::Undefined(_) => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl Serialize for Similarity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Defined(value) => serializer.serialize_f64(*value),
            Self::Undefined(_) => serializer.serialize_none(),
        }
    }
}

/// Customer x item mean review scores, stored per item as centered ratings
/// sorted by customer index. Absent pairs are simply not present.
#[derive(Clone, Debug, Default)]
pub struct RatingMatrix {
    items: Vec<ItemName>,
    centered: Vec<Vec<(usize, f64)>>,
    customer_count: usize,
}

impl RatingMatrix {
    pub fn from_table(table: &TransactionTable) -> Self {
        let mut customers: BTreeMap<&CustomerId, usize> = BTreeMap::new();
        for transaction in table.transactions() {
            customers.entry(&transaction.customer_id).or_insert(0);
        }
        for (index, slot) in customers.values_mut().enumerate() {
            *slot = index;
        }

        let mut sums: BTreeMap<&ItemName, BTreeMap<usize, (f64, u32)>> = BTreeMap::new();
        for transaction in table.transactions() {
            let Some(review) = transaction.review else {
                continue;
            };
            let Some(customer) = customers.get(&transaction.customer_id).copied() else {
                continue;
            };
            let cell = sums.entry(&transaction.item).or_default().entry(customer).or_default();
            cell.0 += review;
            cell.1 += 1;
        }

        let mut items = Vec::with_capacity(sums.len());
        let mut centered = Vec::with_capacity(sums.len());
        for (item, by_customer) in sums {
            let ratings: Vec<(usize, f64)> = by_customer
                .into_iter()
                .map(|(customer, (sum, count))| (customer, sum / f64::from(count)))
                .collect();
            let item_mean =
                ratings.iter().map(|(_, rating)| rating).sum::<f64>() / ratings.len() as f64;

            items.push(item.clone());
            centered.push(
                ratings.into_iter().map(|(customer, rating)| (customer, rating - item_mean)).collect(),
            );
        }

        Self { items, centered, customer_count: customers.len() }
    }

    pub fn items(&self) -> &[ItemName] {
        &self.items
    }

    pub fn customer_count(&self) -> usize {
        self.customer_count
    }

    pub fn raters(&self, index: usize) -> usize {
        self.centered.get(index).map_or(0, Vec::len)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarityEngine {
    config: SimilarityConfig,
}

impl SimilarityEngine {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Full n x n matrix. Only the upper triangle is computed; the lower half mirrors it.
    pub fn compute(&self, ratings: &RatingMatrix) -> SimilarityMatrix {
        let n = ratings.items.len();
        let upper: Vec<(usize, usize, Similarity)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i..n).map(move |j| {
                    (i, j, self.pair(&ratings.centered[i], &ratings.centered[j]))
                })
            })
            .collect();

        let mut cells =
            vec![Similarity::Undefined(UndefinedReason::InsufficientSupport { shared: 0 }); n * n];
        for (i, j, similarity) in upper {
            cells[i * n + j] = similarity;
            cells[j * n + i] = similarity;
        }

        SimilarityMatrix::new(ratings.items.clone(), cells)
    }

    fn pair(&self, left: &[(usize, f64)], right: &[(usize, f64)]) -> Similarity {
        let mut shared = 0usize;
        let (mut dot, mut left_sq, mut right_sq) = (0.0, 0.0, 0.0);

        let (mut a, mut b) = (0, 0);
        while a < left.len() && b < right.len() {
            let (left_customer, left_rating) = left[a];
            let (right_customer, right_rating) = right[b];
            if left_customer < right_customer {
                a += 1;
            } else if right_customer < left_customer {
                b += 1;
            } else {
                shared += 1;
                dot += left_rating * right_rating;
                left_sq += left_rating * left_rating;
                right_sq += right_rating * right_rating;
                a += 1;
                b += 1;
            }
        }

        if shared < self.config.min_shared_raters {
            return Similarity::Undefined(UndefinedReason::InsufficientSupport { shared });
        }

        let denominator = (left_sq * right_sq).sqrt();
        if denominator <= 0.0 || !denominator.is_finite() {
            return Similarity::Undefined(UndefinedReason::ZeroVariance);
        }

        Similarity::Defined((dot / denominator).clamp(-1.0, 1.0))
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SimilarItem {
    pub item: ItemName,
    pub similarity: f64,
}

/// Square, symmetric item x item table in row-major order.
#[derive(Clone, Debug, Default)]
pub struct SimilarityMatrix {
    items: Vec<ItemName>,
    index: HashMap<ItemName, usize>,
    cells: Vec<Similarity>,
}

impl SimilarityMatrix {
    fn new(items: Vec<ItemName>, cells: Vec<Similarity>) -> Self {
        let index = items.iter().enumerate().map(|(position, item)| (item.clone(), position)).collect();
        Self { items, index, cells }
    }

    pub fn items(&self) -> &[ItemName] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, item: &ItemName) -> Option<usize> {
        self.index.get(item).copied()
    }

    /// `None` when either item has no ratings at all.
    pub fn get(&self, left: &ItemName, right: &ItemName) -> Option<Similarity> {
        let (i, j) = (self.index_of(left)?, self.index_of(right)?);
        Some(self.at(i, j))
    }

    pub(crate) fn at(&self, i: usize, j: usize) -> Similarity {
        self.cells[i * self.items.len() + j]
    }

    pub fn row(&self, item: &ItemName) -> Option<impl Iterator<Item = (&ItemName, Similarity)> + '_> {
        let i = self.index_of(item)?;
        Some(self.items.iter().enumerate().map(move |(j, other)| (other, self.at(i, j))))
    }

    pub fn undefined_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_defined()).count()
    }

    /// Other items ranked by defined similarity, highest first, ties alphabetical.
    pub fn most_similar(&self, item: &ItemName, top_n: usize) -> Option<Vec<SimilarItem>> {
        let mut ranked: Vec<SimilarItem> = self
            .row(item)?
            .filter(|(other, _)| *other != item)
            .filter_map(|(other, similarity)| {
                similarity.value().map(|value| SimilarItem { item: other.clone(), similarity: value })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.similarity.total_cmp(&a.similarity).then_with(|| a.item.cmp(&b.item))
        });
        ranked.truncate(top_n);
        Some(ranked)
    }
}

impl Serialize for SimilarityMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'a>(&'a SimilarityMatrix, usize);

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.items.len()))?;
                for (j, other) in self.0.items.iter().enumerate() {
                    map.serialize_entry(other, &self.0.at(self.1, j))?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for (i, item) in self.items.iter().enumerate() {
            map.serialize_entry(item, &Row(self, i))?;
        }
        map.end()
    }
}
