//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ledger::LedgerOptions;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// File holding the persisted snapshot
    pub store_path: PathBuf,

    /// How long a deletion can be undone
    pub undo_window: Duration,

    /// Directory CSV exports are written to
    pub export_dir: PathBuf,

    /// Symbol shown before money values in summaries
    pub currency_symbol: String,

    /// Start empty (instead of failing) when the snapshot is unreadable
    pub recover_corrupt: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_path: PathBuf = lookup("LEDGER_STORE_PATH")
            .unwrap_or_else(|| "transactions.json".to_string())
            .into();

        let undo_window_ms: u64 = lookup("UNDO_WINDOW_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("UNDO_WINDOW_MS"))?;

        let export_dir: PathBuf = lookup("EXPORT_DIR").unwrap_or_else(|| ".".to_string()).into();

        let currency_symbol = lookup("CURRENCY_SYMBOL").unwrap_or_else(|| "₹".to_string());

        let recover_corrupt = match lookup("LEDGER_RECOVER_CORRUPT") {
            Some(value) => parse_bool(&value)
                .ok_or(ConfigError::InvalidValue("LEDGER_RECOVER_CORRUPT"))?,
            None => true,
        };

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        Ok(Self {
            store_path,
            undo_window: Duration::from_millis(undo_window_ms),
            export_dir,
            currency_symbol,
            recover_corrupt,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Options for opening the ledger
    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            undo_window: self.undo_window,
            recover_corrupt: self.recover_corrupt,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
