use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::item::ItemName;
use crate::domain::transaction::TransactionTable;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemUnits {
    pub item: ItemName,
    pub units_sold: u32,
}

/// Headline numbers for one transaction snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_sales: Decimal,
    pub unique_customers: usize,
    /// Mean over reviewed transactions; `None` when none carry a review.
    pub average_review: Option<f64>,
    pub transaction_count: usize,
    /// Units per item, most sold first, ties alphabetical.
    pub units_by_item: Vec<ItemUnits>,
}

impl SalesSummary {
    pub fn from_table(table: &TransactionTable) -> Self {
        let transactions = table.transactions();
        let total_sales = transactions.iter().map(|transaction| transaction.amount_usd).sum();
        let reviews: Vec<f64> = transactions.iter().filter_map(|transaction| transaction.review).collect();
        let average_review =
            (!reviews.is_empty()).then(|| reviews.iter().sum::<f64>() / reviews.len() as f64);

        let mut units: BTreeMap<&ItemName, u32> = BTreeMap::new();
        for transaction in transactions {
            *units.entry(&transaction.item).or_default() += 1;
        }
        let mut units_by_item: Vec<ItemUnits> = units
            .into_iter()
            .map(|(item, units_sold)| ItemUnits { item: item.clone(), units_sold })
            .collect();
        units_by_item.sort_by(|a, b| b.units_sold.cmp(&a.units_sold).then_with(|| a.item.cmp(&b.item)));

        Self {
            total_sales,
            unique_customers: table.customers().len(),
            average_review,
            transaction_count: transactions.len(),
            units_by_item,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::SalesSummary;
    use crate::domain::item::ItemCatalog;
    use crate::domain::transaction::{TransactionRecord, TransactionTable};

    fn sale(customer: &str, item: &str, cents: i64, review: f64) -> TransactionRecord {
        TransactionRecord {
            customer_id: customer.to_string(),
            item: item.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 15).expect("valid date"),
            amount_usd: Some(Decimal::new(cents, 2)),
            review: Some(review),
            payment: "Cash".to_string(),
        }
    }

    #[test]
    fn summarizes_totals_and_ranks_units() {
        let (table, _) = TransactionTable::from_records(
            vec![
                sale("A", "Skirt", 1_050, 4.0),
                sale("B", "Skirt", 2_000, 2.0),
                sale("A", "Coat", 9_999, 3.0),
                sale("C", "Blouse", 1, 5.0),
            ],
            &ItemCatalog::default(),
        );
        let summary = SalesSummary::from_table(&table);

        assert_eq!(summary.total_sales, Decimal::new(13_050, 2));
        assert_eq!(summary.unique_customers, 3);
        assert_eq!(summary.transaction_count, 4);
        assert_eq!(summary.average_review, Some(3.5));

        let ranked: Vec<(&str, u32)> =
            summary.units_by_item.iter().map(|row| (row.item.as_str(), row.units_sold)).collect();
        assert_eq!(ranked, vec![("Skirt", 2), ("Blouse", 1), ("Coat", 1)]);
    }

    #[test]
    fn empty_table_has_no_average_review() {
        let (table, _) = TransactionTable::from_records(Vec::<TransactionRecord>::new(), &ItemCatalog::default());
        let summary = SalesSummary::from_table(&table);

        assert_eq!(summary.total_sales, Decimal::ZERO);
        assert_eq!(summary.average_review, None);
        assert!(summary.units_by_item.is_empty());
    }

    #[test]
    fn unreviewed_sales_count_toward_totals_but_not_the_average() {
        let mut unreviewed = sale("B", "Coat", 5_000, 0.0);
        unreviewed.review = None;
        let (table, _) = TransactionTable::from_records(
            vec![sale("A", "Coat", 10_000, 2.0), unreviewed],
            &ItemCatalog::default(),
        );
        let summary = SalesSummary::from_table(&table);

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_sales, Decimal::new(15_000, 2));
        assert_eq!(summary.average_review, Some(2.0));
    }
}
