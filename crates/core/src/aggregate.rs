//! Monthly item-level sales aggregate shared by forecasting and timing.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::item::ItemName;
use crate::domain::month::Month;
use crate::domain::transaction::TransactionTable;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlySales {
    pub total_sales: Decimal,
    pub units_sold: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub item: ItemName,
    pub month: Month,
    pub total_sales: Decimal,
    pub units_sold: u32,
}

/// One gap-filled observation per calendar month.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlySeries {
    pub months: Vec<Month>,
    pub sales: Vec<f64>,
}

impl MonthlySeries {
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn last_month(&self) -> Option<Month> {
        self.months.last().copied()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MonthlyAggregate {
    by_item: BTreeMap<ItemName, BTreeMap<Month, MonthlySales>>,
}

impl MonthlyAggregate {
    pub fn from_table(table: &TransactionTable) -> Self {
        let mut by_item: BTreeMap<ItemName, BTreeMap<Month, MonthlySales>> = BTreeMap::new();
        for transaction in table.transactions() {
            let cell = by_item
                .entry(transaction.item.clone())
                .or_default()
                .entry(transaction.month())
                .or_default();
            cell.total_sales += transaction.amount_usd;
            cell.units_sold += 1;
        }
        Self { by_item }
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemName> {
        self.by_item.keys()
    }

    /// Observed months for `item` only, chronological.
    pub fn months(&self, item: &ItemName) -> Option<&BTreeMap<Month, MonthlySales>> {
        self.by_item.get(item)
    }

    pub fn rows(&self, item: &ItemName) -> Vec<MonthlyRow> {
        self.by_item
            .get(item)
            .map(|months| {
                months
                    .iter()
                    .map(|(month, sales)| MonthlyRow {
                        item: item.clone(),
                        month: *month,
                        total_sales: sales.total_sales,
                        units_sold: sales.units_sold,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sales from the item's first to last observed month with absent months filled as zero.
    pub fn series(&self, item: &ItemName) -> Option<MonthlySeries> {
        let months = self.by_item.get(item)?;
        let (first, _) = months.first_key_value()?;
        let (last, _) = months.last_key_value()?;

        let (months_filled, sales): (Vec<Month>, Vec<f64>) = first
            .through(*last)
            .map(|month| {
                let total = months
                    .get(&month)
                    .and_then(|cell| cell.total_sales.to_f64())
                    .unwrap_or(0.0);
                (month, total)
            })
            .unzip();

        Some(MonthlySeries { months: months_filled, sales })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::MonthlyAggregate;
    use crate::domain::item::ItemCatalog;
    use crate::domain::month::Month;
    use crate::domain::transaction::{TransactionRecord, TransactionTable};

    fn record(item: &str, year: i32, month: u32, day: u32, amount: i64) -> TransactionRecord {
        TransactionRecord {
            customer_id: "C-1".to_string(),
            item: item.to_string(),
            date: NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
            amount_usd: Some(Decimal::from(amount)),
            review: Some(3.0),
            payment: "Cash".to_string(),
        }
    }

    #[test]
    fn sums_sales_and_counts_units_per_month() {
        let catalog = ItemCatalog::default();
        let (table, _) = TransactionTable::from_records(
            vec![
                record("Coat", 2023, 1, 3, 10),
                record("Coat", 2023, 1, 28, 15),
                record("Coat", 2023, 2, 1, 7),
                record("Vest", 2023, 1, 9, 4),
            ],
            &catalog,
        );
        let aggregate = MonthlyAggregate::from_table(&table);
        let coat = catalog.canonicalize("coat").expect("coat is known");

        let rows = aggregate.rows(&coat);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_sales, Decimal::from(25));
        assert_eq!(rows[0].units_sold, 2);
        assert_eq!(rows[1].month, Month::new(2023, 2).expect("valid month"));
        assert_eq!(aggregate.items().count(), 2);
    }

    #[test]
    fn series_fills_missing_months_with_zero() {
        let catalog = ItemCatalog::default();
        let (table, _) = TransactionTable::from_records(
            vec![record("Coat", 2023, 11, 3, 10), record("Coat", 2024, 2, 14, 30)],
            &catalog,
        );
        let aggregate = MonthlyAggregate::from_table(&table);
        let coat = catalog.canonicalize("Coat").expect("coat is known");

        let series = aggregate.series(&coat).expect("coat has sales");
        assert_eq!(series.sales, vec![10.0, 0.0, 0.0, 30.0]);
        assert_eq!(series.months.first().map(ToString::to_string), Some("2023-11-01".to_string()));
        assert_eq!(series.last_month(), Month::new(2024, 2));

        let vest = catalog.canonicalize("Vest").expect("vest is known");
        assert!(aggregate.series(&vest).is_none());
    }
}
