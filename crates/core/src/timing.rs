use serde::Serialize;

use crate::aggregate::MonthlyAggregate;
use crate::domain::item::ItemName;
use crate::domain::month::Month;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimingRow {
    pub item: ItemName,
    pub first_month: Month,
    pub peak_month: Month,
    pub lead_time_months: u32,
}

/// First-sale and peak-sales month per item, alphabetical by item. Peak ties go to
/// the earliest month.
pub fn timing(aggregate: &MonthlyAggregate) -> Result<Vec<TimingRow>, DomainError> {
    let mut rows = Vec::new();

    for item in aggregate.items() {
        let Some(months) = aggregate.months(item) else {
            continue;
        };
        let Some((&first_month, first_sales)) = months.first_key_value() else {
            continue;
        };

        let mut peak = (first_month, first_sales.total_sales);
        for (month, sales) in months {
            if sales.total_sales > peak.1 {
                peak = (*month, sales.total_sales);
            }
        }
        let peak_month = peak.0;

        let lead = first_month.months_until(peak_month);
        let lead_time_months = u32::try_from(lead).map_err(|_| {
            DomainError::InvariantViolation(format!(
                "lead time for `{item}` is negative ({lead} months): peak {peak_month} precedes first sale {first_month}"
            ))
        })?;

        rows.push(TimingRow { item: item.clone(), first_month, peak_month, lead_time_months });
    }

    Ok(rows)
}
