//! Ledger Events
//!
//! Notifications broadcast after the ledger changed. The presentation layer
//! subscribes to them to know when to re-render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionId};

/// Something that has happened to the ledger.
///
/// Adjacently tagged: exact-precision amounts and integer ids only read back
/// when the payload is not buffered, which internal tagging requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    /// A transaction was recorded
    TransactionAdded {
        transaction: Transaction,
        occurred_at: DateTime<Utc>,
    },

    /// A transaction's description or amount changed
    TransactionUpdated {
        transaction: Transaction,
        occurred_at: DateTime<Utc>,
    },

    /// A transaction left the active set and can be undone until the window closes
    TransactionRemoved {
        transaction: Transaction,
        undo_window_ms: u64,
        occurred_at: DateTime<Utc>,
    },

    /// A removed transaction was put back
    TransactionRestored {
        transaction: Transaction,
        occurred_at: DateTime<Utc>,
    },

    /// The undo window closed; the removed transaction is gone for good
    PendingDeletionExpired {
        transaction_id: TransactionId,
        occurred_at: DateTime<Utc>,
    },

    /// Every transaction (and any pending deletion) was discarded
    LedgerReset {
        discarded: usize,
        occurred_at: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::TransactionAdded { .. } => "TransactionAdded",
            LedgerEvent::TransactionUpdated { .. } => "TransactionUpdated",
            LedgerEvent::TransactionRemoved { .. } => "TransactionRemoved",
            LedgerEvent::TransactionRestored { .. } => "TransactionRestored",
            LedgerEvent::PendingDeletionExpired { .. } => "PendingDeletionExpired",
            LedgerEvent::LedgerReset { .. } => "LedgerReset",
        }
    }

    /// Get the transaction ID this event relates to, if any
    pub fn transaction_id(&self) -> Option<TransactionId> {
        match self {
            LedgerEvent::TransactionAdded { transaction, .. }
            | LedgerEvent::TransactionUpdated { transaction, .. }
            | LedgerEvent::TransactionRemoved { transaction, .. }
            | LedgerEvent::TransactionRestored { transaction, .. } => Some(transaction.id()),
            LedgerEvent::PendingDeletionExpired { transaction_id, .. } => Some(*transaction_id),
            LedgerEvent::LedgerReset { .. } => None,
        }
    }

    /// Whether the active transaction list (and so the aggregates) changed
    pub fn changes_snapshot(&self) -> bool {
        !matches!(self, LedgerEvent::PendingDeletionExpired { .. })
    }
}
