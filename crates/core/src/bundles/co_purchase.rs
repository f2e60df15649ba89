use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::item::ItemName;
use crate::domain::transaction::{CustomerId, TransactionTable};

/// Number of customers who bought both items of each pair. Repeat purchases collapse
/// to a single flag, so the diagonal is the item's distinct-buyer count.
#[derive(Clone, Debug, Default)]
pub struct CoPurchaseMatrix {
    items: Vec<ItemName>,
    index: HashMap<ItemName, usize>,
    counts: Vec<u32>,
}

impl CoPurchaseMatrix {
    pub fn from_table(table: &TransactionTable) -> Self {
        let items: Vec<ItemName> = table.items().into_iter().collect();
        let index: HashMap<ItemName, usize> =
            items.iter().enumerate().map(|(position, item)| (item.clone(), position)).collect();

        let mut baskets: BTreeMap<&CustomerId, BTreeSet<usize>> = BTreeMap::new();
        for transaction in table.transactions() {
            if let Some(position) = index.get(&transaction.item) {
                baskets.entry(&transaction.customer_id).or_default().insert(*position);
            }
        }

        let n = items.len();
        let mut counts = vec![0u32; n * n];
        for basket in baskets.values() {
            for &i in basket {
                for &j in basket {
                    counts[i * n + j] += 1;
                }
            }
        }

        Self { items, index, counts }
    }

    pub fn items(&self) -> &[ItemName] {
        &self.items
    }

    pub fn get(&self, left: &ItemName, right: &ItemName) -> Option<u32> {
        let (i, j) = (self.index.get(left)?, self.index.get(right)?);
        Some(self.counts[i * self.items.len() + j])
    }

    pub fn row(&self, item: &ItemName) -> Option<impl Iterator<Item = (&ItemName, u32)> + '_> {
        let i = *self.index.get(item)?;
        let n = self.items.len();
        Some(self.items.iter().enumerate().map(move |(j, other)| (other, self.counts[i * n + j])))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::CoPurchaseMatrix;
    use crate::domain::item::ItemCatalog;
    use crate::domain::transaction::{TransactionRecord, TransactionTable};

    fn purchase(customer: &str, item: &str) -> TransactionRecord {
        TransactionRecord {
            customer_id: customer.to_string(),
            item: item.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid date"),
            amount_usd: Some(Decimal::from(12)),
            review: Some(3.0),
            payment: "Cash".to_string(),
        }
    }

    #[test]
    fn counts_distinct_customers_per_pair() {
        let catalog = ItemCatalog::default();
        let (table, _) = TransactionTable::from_records(
            vec![
                purchase("C1", "Coat"),
                purchase("C1", "Coat"),
                purchase("C1", "Vest"),
                purchase("C2", "Coat"),
                purchase("C2", "Vest"),
                purchase("C3", "Vest"),
            ],
            &catalog,
        );
        let matrix = CoPurchaseMatrix::from_table(&table);
        let coat = catalog.canonicalize("Coat").expect("coat is known");
        let vest = catalog.canonicalize("Vest").expect("vest is known");

        assert_eq!(matrix.get(&coat, &vest), Some(2));
        assert_eq!(matrix.get(&vest, &coat), Some(2));
        assert_eq!(matrix.get(&coat, &coat), Some(2));
        assert_eq!(matrix.get(&vest, &vest), Some(3));
    }
}
