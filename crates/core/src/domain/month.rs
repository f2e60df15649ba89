use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// A calendar month, ordered chronologically. Serialized as its first day
/// (`YYYY-MM-01`), matching the month-start keys of the monthly aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Signed number of months from `self` to `later`.
    pub fn months_until(self, later: Month) -> i64 {
        let from = i64::from(self.year) * 12 + i64::from(self.month);
        let to = i64::from(later.year) * 12 + i64::from(later.month);
        to - from
    }

    /// Every month from `self` through `last`, inclusive. Empty when `last < self`.
    pub fn through(self, last: Month) -> impl Iterator<Item = Month> {
        let count = self.months_until(last).max(-1) + 1;
        std::iter::successors(Some(self), |month| Some(month.succ())).take(count as usize)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-01", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::Month;

    fn month(year: i32, month: u32) -> Month {
        Month::new(year, month).expect("valid month")
    }

    #[test]
    fn succ_rolls_over_year_boundary() {
        assert_eq!(month(2023, 12).succ(), month(2024, 1));
        assert_eq!(month(2024, 1).succ(), month(2024, 2));
    }

    #[test]
    fn months_until_counts_calendar_months() {
        assert_eq!(month(2023, 11).months_until(month(2024, 2)), 3);
        assert_eq!(month(2024, 2).months_until(month(2024, 2)), 0);
        assert_eq!(month(2024, 2).months_until(month(2023, 11)), -3);
    }

    #[test]
    fn through_is_inclusive_and_empty_when_reversed() {
        let months: Vec<Month> = month(2023, 11).through(month(2024, 1)).collect();
        assert_eq!(months, vec![month(2023, 11), month(2023, 12), month(2024, 1)]);
        assert_eq!(month(2024, 1).through(month(2023, 11)).count(), 0);
    }

    #[test]
    fn month_of_date_and_display() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 19).expect("valid date");
        let m = Month::of(date);
        assert_eq!(m.to_string(), "2023-07-01");
        assert_eq!(m.first_day(), NaiveDate::from_ymd_opt(2023, 7, 1).expect("valid date"));
        assert!(Month::new(2023, 13).is_none());
    }
}
