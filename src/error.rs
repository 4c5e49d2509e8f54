//! Error handling module
//!
//! Centralized error type and its mapping to what the user is shown.

use crate::config::ConfigError;
use crate::domain::DomainError;
use crate::export::ExportError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Rejected input and ledger rules
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Export(#[from] ExportError),

    // Infrastructure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Stable machine-readable code for the error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidDescription(_) => "invalid_description",
                DomainError::InvalidAmount(_) => "invalid_amount",
                DomainError::NotFound(_) => "transaction_not_found",
                DomainError::NoPendingDeletion => "no_pending_deletion",
            },
            AppError::Export(ExportError::EmptyLedger) => "empty_ledger",
            AppError::Export(_) => "export_failed",
            AppError::Store(e) if e.is_corrupt() => "corrupt_snapshot",
            AppError::Store(_) => "storage_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// Whether the user caused this and can fix it by retrying differently
    pub fn is_user_error(&self) -> bool {
        match self {
            AppError::Domain(e) => e.is_client_error(),
            AppError::Export(e) => e.is_empty_ledger(),
            _ => false,
        }
    }

    /// Message for the presentation layer to show.
    ///
    /// Failures the user did not cause are logged here so callers only have
    /// to display the message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Domain(e) if e.is_validation_error() => {
                "Please add a valid description and amount.".to_string()
            }
            AppError::Domain(DomainError::NoPendingDeletion) => "Nothing to undo.".to_string(),
            AppError::Domain(DomainError::NotFound(id)) => {
                tracing::error!(id = %id, "Operation targeted a transaction the ledger does not hold");
                "That transaction no longer exists.".to_string()
            }
            AppError::Domain(e) => e.to_string(),
            AppError::Export(ExportError::EmptyLedger) => {
                "No transactions to download.".to_string()
            }
            AppError::Export(e) => {
                tracing::error!(error = %e, "Export failed");
                "The export could not be written.".to_string()
            }
            AppError::Store(e) => {
                tracing::error!(error = ?e, "Store error");
                "Your changes could not be saved.".to_string()
            }
            AppError::Config(e) => {
                tracing::error!(error = ?e, "Config error");
                format!("Configuration problem: {}", e)
            }
        }
    }
}
