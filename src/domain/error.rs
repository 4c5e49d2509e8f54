//! Domain Error Types
//!
//! Pure domain errors that don't depend on storage or presentation.

use thiserror::Error;

use super::amount::AmountError;
use super::transaction::{DescriptionError, TransactionId};

/// Domain-specific errors
///
/// These errors represent rejected input and ledger rule violations.
/// They are independent of the persistence layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Description is empty after trimming
    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    /// Amount is zero, non-numeric or out of range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// No active transaction with this id
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// Undo requested while nothing is pending
    #[error("No pending deletion to undo")]
    NoPendingDeletion,
}

impl DomainError {
    /// Check if this is a validation failure (user input was rejected)
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::InvalidDescription(_) | Self::InvalidAmount(_))
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        self.is_validation_error() || matches!(self, Self::NoPendingDeletion)
    }

    /// Targeting an id the ledger does not hold means the caller is out of
    /// sync with the ledger, not that the user did something wrong.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

impl From<DescriptionError> for DomainError {
    fn from(err: DescriptionError) -> Self {
        Self::InvalidDescription(err.to_string())
    }
}
