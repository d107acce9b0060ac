use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Every failure a user can trigger. The `Display` text is what the
/// presentation layer shows in its message line.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid amount {input:?}: enter a number such as 1500.00 or -600")]
    Parse { input: String },

    #[error("transaction #{0} not found")]
    NotFound(u64),

    #[error("select a transaction to delete")]
    NoSelection,

    #[error("amount out of range: ledger totals would overflow")]
    Overflow,

    #[error("no transaction ids left to assign")]
    IdsExhausted,

    #[error("duplicate transaction id {0}")]
    DuplicateId(u64),

    #[error("row {row}, column {column}: cannot read {value:?} as {expected}")]
    Format {
        row: u64,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Csv(csv::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

// Keep file-access failures (locked, permission denied) as plain I/O errors
impl From<csv::Error> for TrackerError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return TrackerError::Csv(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => TrackerError::Io(io),
            other => TrackerError::Io(std::io::Error::other(format!("{other:?}"))),
        }
    }
}

impl TrackerError {
    /// Errors that come from user input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TrackerError::Parse { .. }
                | TrackerError::NotFound(_)
                | TrackerError::NoSelection
                | TrackerError::Overflow
        )
    }
}
