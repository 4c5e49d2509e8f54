//! Domain module
//!
//! Core domain types and business rules.

pub mod aggregates;
pub mod amount;
pub mod error;
pub mod events;
pub mod transaction;

pub use aggregates::Aggregates;
pub use amount::{format_money, format_signed_money, round_money, Amount, AmountError, TransactionKind};
pub use error::DomainError;
pub use events::LedgerEvent;
pub use transaction::{Description, DescriptionError, IdGenerator, Transaction, TransactionId};
