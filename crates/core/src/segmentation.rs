//! Sales grouped by item, payment method, and review band.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::item::ItemName;
use crate::domain::transaction::{PaymentMethod, TransactionTable};

/// Review bands over the edges `[0, 2, 3.5, 5]`: the lowest band is closed on both
/// ends, the others are open below and closed above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ReviewBucket {
    #[serde(rename = "low (<=2)")]
    Low,
    #[serde(rename = "medium (2-3.5)")]
    Medium,
    #[serde(rename = "high (>3.5)")]
    High,
}

impl ReviewBucket {
    /// `None` for scores outside [0, 5].
    pub fn from_score(score: f64) -> Option<Self> {
        match score {
            s if (0.0..=2.0).contains(&s) => Some(Self::Low),
            s if s > 2.0 && s <= 3.5 => Some(Self::Medium),
            s if s > 3.5 && s <= 5.0 => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low (<=2)",
            Self::Medium => "medium (2-3.5)",
            Self::High => "high (>3.5)",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentRow {
    pub item: ItemName,
    pub payment: PaymentMethod,
    pub review_bucket: ReviewBucket,
    pub total_sales: Decimal,
    pub units_sold: u32,
    pub avg_review: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Segmentation {
    pub rows: Vec<SegmentRow>,
    /// Transactions whose review fell outside every band.
    pub unbucketed: usize,
    /// Transactions without a review.
    pub unreviewed: usize,
}

impl Segmentation {
    pub fn for_item<'a>(&'a self, item: &'a ItemName) -> impl Iterator<Item = &'a SegmentRow> + 'a {
        self.rows.iter().filter(move |row| &row.item == item)
    }
}

#[derive(Default)]
struct Accumulator {
    total_sales: Decimal,
    units_sold: u32,
    review_sum: f64,
}

pub fn segment(table: &TransactionTable) -> Segmentation {
    let mut groups: BTreeMap<(&ItemName, &PaymentMethod, ReviewBucket), Accumulator> =
        BTreeMap::new();
    let mut unbucketed = 0;
    let mut unreviewed = 0;

    for transaction in table.transactions() {
        let Some(review) = transaction.review else {
            unreviewed += 1;
            continue;
        };
        let Some(bucket) = ReviewBucket::from_score(review) else {
            unbucketed += 1;
            continue;
        };
        let group = groups.entry((&transaction.item, &transaction.payment, bucket)).or_default();
        group.total_sales += transaction.amount_usd;
        group.units_sold += 1;
        group.review_sum += review;
    }

    let mut rows: Vec<SegmentRow> = groups
        .into_iter()
        .map(|((item, payment, bucket), group)| SegmentRow {
            item: item.clone(),
            payment: payment.clone(),
            review_bucket: bucket,
            total_sales: group.total_sales,
            units_sold: group.units_sold,
            avg_review: group.review_sum / f64::from(group.units_sold),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.item
            .cmp(&b.item)
            .then_with(|| b.total_sales.cmp(&a.total_sales))
            .then_with(|| a.payment.cmp(&b.payment))
            .then_with(|| a.review_bucket.cmp(&b.review_bucket))
    });

    Segmentation { rows, unbucketed, unreviewed }
}
