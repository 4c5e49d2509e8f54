//! Zenith Ledger Library
//!
//! Re-exports modules for integration testing and external use.

pub mod domain;
pub mod export;
pub mod handlers;
pub mod ledger;
pub mod store;

pub mod config;
mod error;

pub use config::{Config, ConfigError};
pub use error::{AppError, AppResult};
pub use domain::{Aggregates, Amount, AmountError, DomainError, LedgerEvent};
pub use domain::{Transaction, TransactionId, TransactionKind};
pub use handlers::LedgerService;
pub use ledger::{Ledger, LedgerOptions};
