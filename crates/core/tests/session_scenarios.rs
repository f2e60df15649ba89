use std::fs;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tailor_core::{
    AnalyticsConfig, AnalyticsSession, BacktestOutcome, FutureOutcome, ItemCatalog, Month,
    Similarity, TransactionRecord, TransactionStore, TransactionTable,
};
use tempfile::TempDir;

fn record(customer: &str, item: &str, date: NaiveDate, amount: Decimal, review: f64) -> TransactionRecord {
    TransactionRecord {
        customer_id: customer.to_string(),
        item: item.to_string(),
        date,
        amount_usd: Some(amount),
        review: Some(review),
        payment: "Credit Card".to_string(),
    }
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn session(records: Vec<TransactionRecord>) -> AnalyticsSession {
    let (table, _) = TransactionTable::from_records(records, &ItemCatalog::default());
    AnalyticsSession::new(table, AnalyticsConfig::default())
}

#[test]
fn shared_raters_define_similarity_and_lone_rater_stays_undefined() {
    let mut records = Vec::new();
    for customer in 0..15u32 {
        let id = format!("C{customer:02}");
        let tunic = 1.0 + f64::from(customer % 4);
        let jeans = 5.0 - 0.5 * f64::from(customer % 4) - 0.25 * f64::from(customer % 3);
        records.push(record(&id, "tunic", day(2023, 3, 1), Decimal::from(30), tunic));
        records.push(record(&id, "JEANS", day(2023, 3, 2), Decimal::from(55), jeans));
    }
    records.push(record("C00", "Kimono", day(2023, 4, 9), Decimal::from(70), 4.0));
    let session = session(records);

    let matrix = session.similarity();
    let tunic = session.lookup_item("Tunic").expect("tunic is in the vocabulary");
    let jeans = session.lookup_item("jeans").expect("jeans is in the vocabulary");
    let kimono = session.lookup_item("kimono").expect("kimono is in the vocabulary");

    let pair = matrix.get(&tunic, &jeans).and_then(Similarity::value).expect("pair is defined");
    assert!((-1.0..=1.0).contains(&pair));
    assert!(pair < 0.0, "ratings move in opposite directions");
    assert_eq!(matrix.get(&jeans, &tunic).and_then(Similarity::value), Some(pair));
    assert_eq!(matrix.get(&tunic, &tunic).and_then(Similarity::value), Some(1.0));

    for other in matrix.items() {
        let cell = matrix.get(&kimono, other).expect("kimono is in the matrix");
        assert!(!cell.is_defined(), "kimono vs {other} should be undefined");
    }

    let json = serde_json::to_value(matrix).expect("matrix serializes");
    assert!(json["Kimono"]["Tunic"].is_null());
    assert!(json["Tunic"]["Jeans"].is_number());
}

#[test]
fn constant_monthly_sales_backtest_with_near_zero_error() {
    let records: Vec<TransactionRecord> = (1..=12)
        .map(|month| record("R1", "Raincoat", day(2022, month, 5), Decimal::from(100), 3.0))
        .collect();
    let session = session(records);

    let Some(BacktestOutcome::Completed(report)) = session.backtest("raincoat") else {
        panic!("constant series should backtest");
    };

    assert_eq!(report.train.len(), 9);
    assert_eq!(report.points.len(), 3);
    assert!(report.mape.is_some_and(|mape| mape < 1e-3));
    for point in &report.points {
        assert!(point.upper - point.lower < 1e-2);
        assert!((point.predicted - 100.0).abs() < 1e-2);
    }
}

#[test]
fn future_forecast_emits_requested_consecutive_months() {
    let records: Vec<TransactionRecord> = (0..18u32)
        .map(|offset| {
            let year = 2022 + (offset / 12) as i32;
            let month = offset % 12 + 1;
            let amount = Decimal::from(120 + 4 * offset + (offset % 3) * 7);
            record("J1", "Jacket", day(year, month, 14), amount, 4.0)
        })
        .collect();
    let session = session(records);

    let outcome = session.forecast("jacket", 8).expect("horizon in range");
    let Some(FutureOutcome::Completed(report)) = outcome else {
        panic!("trend series should forecast");
    };

    assert_eq!(report.horizon, 8);
    assert_eq!(report.points.len(), 8);
    assert_eq!(report.points[0].period, Month::new(2023, 7).expect("valid month"));
    assert!(report.points.windows(2).all(|pair| pair[0].period.succ() == pair[1].period));
}

#[test]
fn csv_snapshot_flows_through_session() -> Result<(), String> {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("retail_sales.csv");
    fs::write(
        &path,
        "customerID,item,date,amount_usd,review,payment\n\
         4001,Blouse,2023-01-04,25.50,4.5,Cash\n\
         4001,skirt,15-01-2023,40.00,3.0,Credit Card\n\
         4002,Blouse,02/07/2023,30.00,2.0,Cash\n\
         4002,Skirt,2023-02-10,,4.0,Cash\n\
         4003,Cape,2023-02-11,90.00,5.0,Cash\n\
         4003,Skirt,not-a-date,15.00,1.0,Cash\n",
    )
    .map_err(|err| err.to_string())?;

    let config = AnalyticsConfig::default();
    let (table, report) =
        TransactionStore::load_csv(&path, &config.catalog()).map_err(|err| err.to_string())?;
    assert_eq!(report.rows_read, 6);
    assert_eq!(report.kept, 3);
    assert_eq!(report.missing_amount, 1);
    assert_eq!(report.unknown_item, 1);
    assert_eq!(report.malformed, 1);

    let session = AnalyticsSession::new(table, config);
    let summary = session.summary();
    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.unique_customers, 2);
    assert_eq!(summary.total_sales, Decimal::new(9_550, 2));
    assert_eq!(summary.units_by_item[0].item.as_str(), "Blouse");

    let history = session.customer_history("4001");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].item.as_str(), "Skirt");

    let timing = session.timing().map_err(|err| err.to_string())?;
    assert!(timing.iter().all(|row| row.peak_month >= row.first_month));
    Ok(())
}
