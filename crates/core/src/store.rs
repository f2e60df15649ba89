//! CSV adapter that turns a retail snapshot into a [`TransactionTable`].

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::item::ItemCatalog;
use crate::domain::transaction::{IngestReport, RejectReason, TransactionRecord, TransactionTable};
use crate::errors::IngestError;

pub const REQUIRED_COLUMNS: [&str; 6] =
    ["customerID", "item", "date", "amount_usd", "review", "payment"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "customerID")]
    customer_id: String,
    item: String,
    date: String,
    amount_usd: Option<String>,
    review: Option<String>,
    payment: String,
}

pub struct TransactionStore;

impl TransactionStore {
    pub fn load_csv(
        path: &Path,
        catalog: &ItemCatalog,
    ) -> Result<(TransactionTable, IngestReport), IngestError> {
        let file = File::open(path)
            .map_err(|source| IngestError::Open { path: path.to_path_buf(), source })?;
        Self::read_csv(file, path, catalog)
    }

    /// `source` only labels errors; the rows come from `reader`.
    pub fn read_csv<R: Read>(
        reader: R,
        source: &Path,
        catalog: &ItemCatalog,
    ) -> Result<(TransactionTable, IngestReport), IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|source_error| IngestError::Decode {
                path: source.to_path_buf(),
                source: source_error,
            })?
            .clone();
        if let Some(column) =
            REQUIRED_COLUMNS.into_iter().find(|column| !headers.iter().any(|header| header == *column))
        {
            return Err(IngestError::MissingColumn { path: source.to_path_buf(), column });
        }

        let mut decode_report = IngestReport::default();
        let mut records = Vec::new();

        for (row, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let parsed = match result {
                Ok(raw) => parse_row(raw),
                Err(error) if error.is_io_error() => {
                    return Err(IngestError::Decode { path: source.to_path_buf(), source: error });
                }
                Err(_) => Err(RejectReason::Malformed),
            };

            match parsed {
                Ok(record) => records.push(record),
                Err(reason) => {
                    decode_report.rows_read += 1;
                    decode_report.reject(row, reason);
                }
            }
        }

        let (table, mut report) = TransactionTable::from_records(records, catalog);
        report.absorb(decode_report);
        report.log_summary();

        Ok((table, report))
    }
}

fn parse_row(raw: CsvRow) -> Result<TransactionRecord, RejectReason> {
    let amount = raw
        .amount_usd
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(RejectReason::MissingAmount)?;

    let amount_usd = Decimal::from_str(amount).map_err(|_| RejectReason::Malformed)?;
    let date = parse_date(&raw.date).ok_or(RejectReason::Malformed)?;
    let review = match raw.review.as_deref().filter(|value| !value.is_empty()) {
        Some(value) => Some(value.parse::<f64>().map_err(|_| RejectReason::Malformed)?),
        None => None,
    };

    Ok(TransactionRecord {
        customer_id: raw.customer_id,
        item: raw.item,
        date,
        amount_usd: Some(amount_usd),
        review,
        payment: raw.payment,
    })
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}
