// Settings: defaults -> TOML file -> FINANCE_TRACKER_* env -> CLI overrides

use crate::error::Result;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "finance-tracker.toml";
pub const ENV_PREFIX: &str = "FINANCE_TRACKER";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Spreadsheet file holding the ledger
    pub data_file: PathBuf,
    pub currency_symbol: String,
    /// Single-character cell separator
    pub delimiter: String,
    pub log_level: String,
    /// Where the TUI writes logs; it stays silent when unset
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("transactions.csv"),
            currency_symbol: "$".to_string(),
            delimiter: ",".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Values given on the command line win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_file: Option<PathBuf>,
    pub currency_symbol: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Build settings from an optional TOML file (missing is fine), the
    /// environment, then `overrides`.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let settings = Config::builder()
            .add_source(File::from(path).required(config_path.is_some()))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut app: AppConfig = settings.try_deserialize()?;

        if let Some(data_file) = overrides.data_file {
            app.data_file = data_file;
        }
        if let Some(symbol) = overrides.currency_symbol {
            app.currency_symbol = symbol;
        }
        if let Some(level) = overrides.log_level {
            app.log_level = level;
        }

        app.delimiter_byte()?;
        Ok(app)
    }

    pub fn delimiter_byte(&self) -> std::result::Result<u8, ConfigError> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' => Ok(*b),
            _ => Err(ConfigError::Message(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_file, PathBuf::from("transactions.csv"));
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.delimiter_byte().unwrap(), b',');
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_file_then_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        fs::write(
            &path,
            "data_file = \"/tmp/ledger.csv\"\ncurrency_symbol = \"€\"\ndelimiter = \";\"\n",
        )
        .unwrap();

        let from_file = AppConfig::load(Some(&path), Overrides::default()).unwrap();
        assert_eq!(from_file.data_file, PathBuf::from("/tmp/ledger.csv"));
        assert_eq!(from_file.currency_symbol, "€");
        assert_eq!(from_file.delimiter_byte().unwrap(), b';');

        let overridden = AppConfig::load(
            Some(&path),
            Overrides {
                data_file: Some(PathBuf::from("other.csv")),
                currency_symbol: Some("₽".to_string()),
                log_level: None,
            },
        )
        .unwrap();
        assert_eq!(overridden.data_file, PathBuf::from("other.csv"));
        assert_eq!(overridden.currency_symbol, "₽");
        assert_eq!(overridden.delimiter_byte().unwrap(), b';');
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(AppConfig::load(Some(&missing), Overrides::default()).is_err());
    }

    #[test]
    fn test_bad_delimiter_rejected() {
        let config = AppConfig {
            delimiter: "::".to_string(),
            ..AppConfig::default()
        };
        assert!(config.delimiter_byte().is_err());
    }
}
