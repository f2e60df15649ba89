use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::item::{ItemCatalog, ItemName};
use crate::domain::month::Month;

pub const MIN_REVIEW: f64 = 0.0;
pub const MAX_REVIEW: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PaymentMethod(pub String);

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One validated purchase event.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transaction {
    pub customer_id: CustomerId,
    pub item: ItemName,
    pub date: NaiveDate,
    pub amount_usd: Decimal,
    /// `None` when the purchase carries no review.
    pub review: Option<f64>,
    pub payment: PaymentMethod,
}

impl Transaction {
    pub fn month(&self) -> Month {
        Month::of(self.date)
    }
}

/// A purchase event as supplied by a loader, before vocabulary and range checks.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRecord {
    pub customer_id: String,
    pub item: String,
    pub date: NaiveDate,
    pub amount_usd: Option<Decimal>,
    pub review: Option<f64>,
    pub payment: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MissingAmount,
    UnknownItem,
    Malformed,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingAmount => "missing_amount",
            Self::UnknownItem => "unknown_item",
            Self::Malformed => "malformed",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub kept: usize,
    pub missing_amount: usize,
    pub unknown_item: usize,
    pub malformed: usize,
}

impl IngestReport {
    pub fn rejected(&self) -> usize {
        self.missing_amount + self.unknown_item + self.malformed
    }

    pub(crate) fn reject(&mut self, row: usize, reason: RejectReason) {
        match reason {
            RejectReason::MissingAmount => self.missing_amount += 1,
            RejectReason::UnknownItem => self.unknown_item += 1,
            RejectReason::Malformed => self.malformed += 1,
        }
        debug!(
            event_name = "analytics.ingest.row_rejected",
            row,
            reason = reason.as_str(),
            "transaction row rejected"
        );
    }

    /// Fold another report in, e.g. rows rejected by the CSV decoder before validation.
    pub(crate) fn absorb(&mut self, other: IngestReport) {
        self.rows_read += other.rows_read;
        self.kept += other.kept;
        self.missing_amount += other.missing_amount;
        self.unknown_item += other.unknown_item;
        self.malformed += other.malformed;
    }

    pub(crate) fn log_summary(&self) {
        info!(
            event_name = "analytics.ingest.completed",
            rows_read = self.rows_read,
            kept = self.kept,
            missing_amount = self.missing_amount,
            unknown_item = self.unknown_item,
            malformed = self.malformed,
            "transaction ingestion completed"
        );
    }
}

/// Immutable, validated snapshot of transactions sharing one item vocabulary.
#[derive(Clone, Debug)]
pub struct TransactionTable {
    transactions: Vec<Transaction>,
    catalog: ItemCatalog,
}

impl TransactionTable {
    /// Canonicalize item names and drop rows that break the input contract.
    pub fn from_records<I>(records: I, catalog: &ItemCatalog) -> (Self, IngestReport)
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let mut report = IngestReport::default();
        let mut transactions = Vec::new();

        for (row, record) in records.into_iter().enumerate() {
            report.rows_read += 1;
            match validate(record, catalog) {
                Ok(transaction) => transactions.push(transaction),
                Err(reason) => report.reject(row, reason),
            }
        }
        report.kept = transactions.len();

        (Self { transactions, catalog: catalog.clone() }, report)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Items with at least one transaction, alphabetical.
    pub fn items(&self) -> BTreeSet<ItemName> {
        self.transactions.iter().map(|transaction| transaction.item.clone()).collect()
    }

    pub fn customers(&self) -> BTreeSet<&CustomerId> {
        self.transactions.iter().map(|transaction| &transaction.customer_id).collect()
    }
}

fn validate(record: TransactionRecord, catalog: &ItemCatalog) -> Result<Transaction, RejectReason> {
    let amount_usd = record.amount_usd.ok_or(RejectReason::MissingAmount)?;
    let item = catalog.canonicalize(&record.item).ok_or(RejectReason::UnknownItem)?;

    let customer_id = record.customer_id.trim();
    let review_in_range = record
        .review
        .map_or(true, |review| review.is_finite() && (MIN_REVIEW..=MAX_REVIEW).contains(&review));
    if customer_id.is_empty() || amount_usd.is_sign_negative() || !review_in_range {
        return Err(RejectReason::Malformed);
    }

    Ok(Transaction {
        customer_id: CustomerId(customer_id.to_string()),
        item,
        date: record.date,
        amount_usd,
        review: record.review,
        payment: PaymentMethod(record.payment.trim().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{TransactionRecord, TransactionTable};
    use crate::domain::item::ItemCatalog;

    fn record(item: &str, amount: Option<i64>, review: f64) -> TransactionRecord {
        TransactionRecord {
            customer_id: "C-1".to_string(),
            item: item.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 3, 14).expect("valid date"),
            amount_usd: amount.map(Decimal::from),
            review: Some(review),
            payment: " Credit Card ".to_string(),
        }
    }

    #[test]
    fn from_records_canonicalizes_and_counts_rejections() {
        let catalog = ItemCatalog::default();
        let (table, report) = TransactionTable::from_records(
            vec![
                record("tunic", Some(40), 4.0),
                record("Jeans", None, 3.0),
                record("Handbag", Some(10), 2.0),
                record("Jeans", Some(-5), 2.0),
                record("Jeans", Some(5), 5.5),
                record("JEANS", Some(0), 0.0),
            ],
            &catalog,
        );

        assert_eq!(report.rows_read, 6);
        assert_eq!(report.kept, 2);
        assert_eq!(report.missing_amount, 1);
        assert_eq!(report.unknown_item, 1);
        assert_eq!(report.malformed, 2);
        assert_eq!(report.rejected(), 4);

        let items: Vec<&str> =
            table.transactions().iter().map(|transaction| transaction.item.as_str()).collect();
        assert_eq!(items, vec!["Tunic", "Jeans"]);
        assert_eq!(table.transactions()[0].payment.0, "Credit Card");
    }

    #[test]
    fn review_bounds_are_inclusive() {
        let catalog = ItemCatalog::default();
        let (table, report) = TransactionTable::from_records(
            vec![record("Coat", Some(1), 0.0), record("Coat", Some(1), 5.0)],
            &catalog,
        );
        assert_eq!(report.rejected(), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.items().len(), 1);
    }

    #[test]
    fn missing_review_keeps_the_sale() {
        let catalog = ItemCatalog::default();
        let mut unreviewed = record("Coat", Some(12), 0.0);
        unreviewed.review = None;
        let mut not_a_number = record("Coat", Some(12), 0.0);
        not_a_number.review = Some(f64::NAN);

        let (table, report) = TransactionTable::from_records(vec![unreviewed, not_a_number], &catalog);
        assert_eq!(report.kept, 1);
        assert_eq!(report.malformed, 1);
        assert_eq!(table.transactions()[0].review, None);
        assert_eq!(table.transactions()[0].amount_usd, Decimal::from(12));
    }
}
