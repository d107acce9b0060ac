// Finance Tracker - Core Library
// Exposes ledger, persistence and controller for the CLI, the TUI, and tests

pub mod config;
pub mod error;
pub mod ledger;
pub mod money;
pub mod spreadsheet;     // Spreadsheet Bridge - save/load
pub mod tracker;         // UI-independent event handlers
pub mod transaction;

// Re-export commonly used types
pub use config::{AppConfig, Overrides};
pub use error::{Result, TrackerError};
pub use ledger::{Ledger, Summary};
pub use money::{format_currency, parse_amount};
pub use spreadsheet::SpreadsheetStore;
pub use tracker::{SummaryReport, Tracker};
pub use transaction::Transaction;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
