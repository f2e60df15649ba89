//! Per-customer purchase history and review trend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::item::ItemName;
use crate::domain::transaction::{Transaction, TransactionTable};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewPoint {
    pub date: NaiveDate,
    pub item: ItemName,
    pub amount_usd: Decimal,
    pub review: f64,
}

/// The customer's transactions in date order. Ids are matched after trimming.
/// Same-day purchases keep their input order.
pub fn purchase_history<'a>(table: &'a TransactionTable, customer: &str) -> Vec<&'a Transaction> {
    let customer = customer.trim();
    let mut history: Vec<&Transaction> = table
        .transactions()
        .iter()
        .filter(|transaction| transaction.customer_id.0 == customer)
        .collect();
    history.sort_by_key(|transaction| transaction.date);
    history
}

/// Reviewed purchases only; unreviewed ones have no point on the trend.
pub fn review_trend(history: &[&Transaction]) -> Vec<ReviewPoint> {
    history
        .iter()
        .filter_map(|transaction| {
            Some(ReviewPoint {
                date: transaction.date,
                item: transaction.item.clone(),
                amount_usd: transaction.amount_usd,
                review: transaction.review?,
            })
        })
        .collect()
}
