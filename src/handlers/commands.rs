//! Command definitions
//!
//! Commands carry user intent exactly as it was typed; parsing and
//! validation happen in the handler.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{Aggregates, Transaction, TransactionId};

// =========================================================================
// NewTransactionCommand
// =========================================================================

/// Command to record a new transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransactionCommand {
    /// Description as entered
    pub text: String,
    /// Amount as entered (parsed as a decimal)
    pub amount: String,
}

impl NewTransactionCommand {
    pub fn new(text: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            amount: amount.into(),
        }
    }
}

// =========================================================================
// EditTransactionCommand
// =========================================================================

/// Command to change an existing transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTransactionCommand {
    pub id: TransactionId,
    pub text: String,
    pub amount: String,
}

impl EditTransactionCommand {
    pub fn new(id: TransactionId, text: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            amount: amount.into(),
        }
    }
}

/// Everything the presentation layer needs to render the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerView {
    /// Newest first
    pub transactions: Vec<Transaction>,
    /// Rounded to two decimals
    pub aggregates: Aggregates,
    /// Deletion that can still be undone
    pub pending_deletion: Option<Transaction>,
}

/// Result of a successful export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub rows: usize,
}
