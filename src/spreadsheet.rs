// 📄 Spreadsheet Bridge
// Ledger <-> row-oriented tabular file (CSV, opens in any spreadsheet program)
//
// Layout:
//   row 1     Id | Description | Amount | Date
//   row 2..n  one transaction per row, ledger order, date as dd.mm.yyyy

use crate::error::{Result, TrackerError};
use crate::ledger::{Ledger, Totals};
use crate::money::parse_amount;
use crate::transaction::Transaction;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 4] = ["Id", "Description", "Amount", "Date"];

/// Fixed display pattern for the date column.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

const DATETIME_FORMATS: [&str; 3] = ["%d.%m.%Y %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_ONLY_FORMATS: [&str; 2] = [DATE_FORMAT, "%Y-%m-%d"];

#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Amount")]
    amount: Decimal,
    #[serde(rename = "Date")]
    date: String,
}

impl<'a> From<&'a Transaction> for Row<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Row {
            id: tx.id,
            description: &tx.description,
            amount: tx.amount,
            date: tx.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Save/load adapter bound to one file path.
#[derive(Debug, Clone)]
pub struct SpreadsheetStore {
    path: PathBuf,
    delimiter: u8,
}

impl SpreadsheetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Use another cell separator, e.g. `;` for locales with comma decimals.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole ledger, replacing any previous file content.
    /// Returns the number of transaction rows written.
    pub fn save(&self, ledger: &Ledger) -> Result<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Truncates an existing file, so no stale rows survive
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_path(&self.path)?;

        writer.write_record(HEADER)?;
        for tx in ledger.transactions() {
            writer.serialize(Row::from(tx))?;
        }
        writer.flush()?;

        tracing::info!(path = %self.path.display(), rows = ledger.len(), "ledger saved");
        Ok(ledger.len())
    }

    /// Read every transaction row in file order.
    /// A missing file is the first-run case and yields an empty list.
    pub fn load(&self) -> Result<Vec<Transaction>> {
        // Only a genuinely absent file means first run; anything else
        // (permissions, a parent that is not a directory) is an I/O error
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no data file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut transactions = Vec::new();
        let mut totals = Totals::default();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let tx = parse_row(&record)?;
            if totals.push(tx.amount).is_none() {
                return Err(TrackerError::Format {
                    row: row_number(&record),
                    column: "Amount",
                    value: tx.amount.to_string(),
                    expected: "an amount that keeps the ledger totals in range",
                });
            }
            transactions.push(tx);
        }

        tracing::info!(path = %self.path.display(), rows = transactions.len(), "ledger loaded");
        Ok(transactions)
    }

    /// Load the file into `ledger`. On any error the ledger keeps its
    /// previous contents.
    pub fn load_into(&self, ledger: &mut Ledger) -> Result<usize> {
        let transactions = self.load()?;
        ledger.replace_all(transactions)?;

        if ledger.balance() != ledger.recomputed_balance() {
            tracing::warn!(
                balance = %ledger.balance(),
                recomputed = %ledger.recomputed_balance(),
                "balance mismatch after load"
            );
        }
        Ok(ledger.len())
    }
}

// Header is row 1
fn row_number(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn parse_row(record: &StringRecord) -> Result<Transaction> {
    let row = row_number(record);

    if record.len() != HEADER.len() {
        return Err(TrackerError::Format {
            row,
            column: "*",
            value: record.iter().collect::<Vec<_>>().join(","),
            expected: "4 cells (Id, Description, Amount, Date)",
        });
    }

    let cell = |i: usize| record.get(i).unwrap_or("");
    let format_err = |column: &'static str, value: &str, expected: &'static str| TrackerError::Format {
        row,
        column,
        value: value.to_string(),
        expected,
    };

    let id_text = cell(0).trim();
    let id = id_text
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0 && *id < u64::MAX)
        .ok_or_else(|| format_err("Id", id_text, "a positive integer below 18446744073709551615"))?;

    let description = cell(1).to_string();

    let amount_text = cell(2);
    let amount = parse_amount(amount_text).map_err(|_| format_err("Amount", amount_text, "a decimal number"))?;

    let date_text = cell(3).trim();
    let date = parse_date(date_text).ok_or_else(|| format_err("Date", date_text, "a date (dd.mm.yyyy)"))?;

    Ok(Transaction::new(id, description, amount, date))
}

/// Accepts the saved `dd.mm.yyyy` pattern plus full timestamps and ISO
/// dates; date-only values become midnight.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_ONLY_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
