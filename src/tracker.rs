// Tracker - UI-independent event handlers
// Presentation adapters (TUI, CLI) call these instead of touching the ledger

use crate::config::AppConfig;
use crate::error::{Result, TrackerError};
use crate::ledger::{Ledger, Summary};
use crate::money::format_currency;
use crate::spreadsheet::SpreadsheetStore;
use crate::transaction::Transaction;
use chrono::Local;

/// Income/expense totals ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub summary: Summary,
    pub income: String,
    /// Absolute value of the (negative) expense total
    pub expense: String,
    pub net: String,
}

impl SummaryReport {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Total income:  {}", self.income),
            format!("Total expense: {}", self.expense),
            format!("Net balance:   {}", self.net),
        ]
    }
}

pub struct Tracker {
    ledger: Ledger,
    store: SpreadsheetStore,
    currency_symbol: String,
}

impl Tracker {
    pub fn new(store: SpreadsheetStore, currency_symbol: impl Into<String>) -> Self {
        Self {
            ledger: Ledger::new(),
            store,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Build from settings and load the data file (first run: empty ledger).
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = SpreadsheetStore::new(&config.data_file).with_delimiter(config.delimiter_byte()?);
        let mut tracker = Self::new(store, config.currency_symbol.clone());
        tracker.reload()?;
        Ok(tracker)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &SpreadsheetStore {
        &self.store
    }

    pub fn add(&mut self, description: &str, amount_text: &str) -> Result<Transaction> {
        self.ledger.add(description, amount_text, Local::now().naive_local())
    }

    /// Delete the row the user picked; `None` means nothing was selected.
    pub fn delete_selected(&mut self, selected: Option<u64>) -> Result<Transaction> {
        let id = selected.ok_or(TrackerError::NoSelection)?;
        self.ledger.delete(id)
    }

    /// Write the ledger and return a confirmation message.
    pub fn save(&self) -> Result<String> {
        let rows = self.store.save(&self.ledger)?;
        Ok(format!("Saved {} transactions to {}", rows, self.store.path().display()))
    }

    /// Re-read the data file. The ledger is unchanged if this fails.
    pub fn reload(&mut self) -> Result<String> {
        let rows = self.store.load_into(&mut self.ledger)?;
        Ok(format!("Loaded {} transactions from {}", rows, self.store.path().display()))
    }

    pub fn summary_report(&self) -> SummaryReport {
        let summary = self.ledger.summary();
        SummaryReport {
            income: self.money(summary.total_income),
            expense: self.money(summary.absolute_expense()),
            net: self.money(summary.net_balance),
            summary,
        }
    }

    pub fn balance_text(&self) -> String {
        format!("Balance: {}", self.money(self.ledger.balance()))
    }

    pub fn money(&self, amount: rust_decimal::Decimal) -> String {
        format_currency(amount, &self.currency_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn tracker_at(path: PathBuf) -> Tracker {
        Tracker::new(SpreadsheetStore::new(path), "$")
    }

    #[test]
    fn test_open_first_run_starts_empty() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            data_file: dir.path().join("fresh.csv"),
            ..AppConfig::default()
        };

        let tracker = Tracker::open(&config).unwrap();

        assert!(tracker.ledger().is_empty());
        assert_eq!(tracker.balance_text(), "Balance: $0.00");
    }

    #[test]
    fn test_delete_without_selection() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_at(dir.path().join("t.csv"));
        tracker.add("A", "1").unwrap();

        let err = tracker.delete_selected(None).unwrap_err();

        assert!(matches!(err, TrackerError::NoSelection));
        assert_eq!(tracker.ledger().len(), 1);
    }

    #[test]
    fn test_summary_report_shows_absolute_expense() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_at(dir.path().join("t.csv"));
        tracker.add("A", "100").unwrap();
        tracker.add("B", "-40").unwrap();

        let report = tracker.summary_report();

        assert_eq!(report.summary.total_expense, Decimal::from_str("-40").unwrap());
        assert_eq!(report.income, "$100.00");
        assert_eq!(report.expense, "$40.00");
        assert_eq!(report.net, "$60.00");
        assert_eq!(report.lines()[1], "Total expense: $40.00");
    }

    #[test]
    fn test_save_then_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut tracker = tracker_at(path.clone());
        tracker.add("Salary", "1500.00").unwrap();
        tracker.add("Rent", "-600.00").unwrap();

        let message = tracker.save().unwrap();
        assert!(message.starts_with("Saved 2 transactions"));

        let config = AppConfig {
            data_file: path,
            ..AppConfig::default()
        };
        let reopened = Tracker::open(&config).unwrap();
        assert_eq!(reopened.ledger().len(), 2);
        assert_eq!(reopened.balance_text(), "Balance: $900.00");
        assert_eq!(reopened.ledger().next_id(), 3);
    }

    #[test]
    fn test_reload_failure_keeps_ledger() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "Id,Description,Amount,Date\nnope,A,1,01.01.2024\n").unwrap();
        let mut tracker = tracker_at(path);
        tracker.add("Kept", "3").unwrap();

        let err = tracker.reload().unwrap_err();

        assert!(matches!(err, TrackerError::Format { .. }));
        assert_eq!(tracker.ledger().len(), 1);
    }
}
