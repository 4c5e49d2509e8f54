//! Ledger module
//!
//! The in-memory transaction ledger and its synchronization with the
//! snapshot store.
//!
//! Every mutation follows the same order: validate, write the candidate
//! snapshot to the store, then commit it in memory and announce it. A
//! rejected input or a failed write leaves the ledger exactly as it was.

pub mod undo;

pub use undo::{DeletedTransaction, UndoController, DEFAULT_UNDO_WINDOW};

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use crate::domain::{
    Aggregates, Amount, Description, DomainError, IdGenerator, LedgerEvent, Transaction,
    TransactionId,
};
use crate::error::AppResult;
use crate::store::{SnapshotStore, StoreError};

/// Capacity of the event channel; slow subscribers skip older events
const EVENT_CAPACITY: usize = 64;

/// Options for opening a ledger
#[derive(Debug, Clone)]
pub struct LedgerOptions {
    /// How long a deletion can be undone
    pub undo_window: Duration,
    /// Start empty when the stored snapshot is unreadable
    pub recover_corrupt: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            undo_window: DEFAULT_UNDO_WINDOW,
            recover_corrupt: true,
        }
    }
}

/// The transaction ledger.
pub struct Ledger {
    transactions: Vec<Transaction>,
    store: Box<dyn SnapshotStore>,
    undo: UndoController,
    ids: IdGenerator,
    /// Bumped by every reset; deletions from an earlier epoch are not restorable
    epoch: u64,
    events: broadcast::Sender<LedgerEvent>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("transactions", &self.transactions)
            .field("undo", &self.undo)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Open the ledger stored in `store`.
    ///
    /// A missing snapshot opens an empty ledger. An unreadable one is moved
    /// aside and replaced by an empty ledger when `recover_corrupt` is set,
    /// and is an error otherwise.
    pub fn open(store: impl SnapshotStore + 'static, options: &LedgerOptions) -> AppResult<Self> {
        let transactions = match store.load() {
            Ok(transactions) => transactions,
            Err(e) if e.is_corrupt() && options.recover_corrupt => {
                tracing::warn!(error = %e, "Stored snapshot is unreadable, starting with an empty ledger");
                store.quarantine()?;
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let transactions = dedupe(transactions);
        tracing::info!(transactions = transactions.len(), "Ledger opened");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            ids: IdGenerator::seeded(transactions.iter().map(Transaction::id)),
            transactions,
            store: Box::new(store),
            undo: UndoController::new(options.undo_window).with_events(events.clone()),
            epoch: 0,
            events,
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Record a new transaction.
    ///
    /// # Errors
    /// - `DomainError::InvalidDescription` if `text` is blank
    /// - `DomainError::InvalidAmount` if `amount` is zero or out of range
    /// - `AppError::Store` if the snapshot could not be written
    pub fn add(&mut self, text: &str, amount: Decimal) -> AppResult<Transaction> {
        let (text, amount) = validate(text, amount)?;

        let transaction = Transaction::new(self.ids.next_id(), text, amount);
        let mut next = self.transactions.clone();
        next.push(transaction.clone());
        self.commit(next)?;

        tracing::info!(
            id = %transaction.id(),
            amount = %transaction.amount(),
            "Transaction added"
        );
        self.emit(LedgerEvent::TransactionAdded {
            transaction: transaction.clone(),
            occurred_at: Utc::now(),
        });
        Ok(transaction)
    }

    /// Replace the description and amount of an existing transaction.
    pub fn update(&mut self, id: TransactionId, text: &str, amount: Decimal) -> AppResult<Transaction> {
        let (text, amount) = validate(text, amount)?;
        let index = self.position(id)?;

        let transaction = self.transactions[index].with_details(text, amount);
        let mut next = self.transactions.clone();
        next[index] = transaction.clone();
        self.commit(next)?;

        tracing::info!(id = %id, amount = %transaction.amount(), "Transaction updated");
        self.emit(LedgerEvent::TransactionUpdated {
            transaction: transaction.clone(),
            occurred_at: Utc::now(),
        });
        Ok(transaction)
    }

    /// Take a transaction out of the ledger and make it the pending deletion.
    ///
    /// The removal is persisted (and reflected in the aggregates) right away;
    /// only its reversal is time-limited. Any deletion that was still pending
    /// is discarded for good.
    pub fn remove(&mut self, id: TransactionId) -> AppResult<Transaction> {
        let index = self.position(id)?;

        let mut next = self.transactions.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        self.undo
            .initiate(DeletedTransaction::new(removed.clone(), self.epoch));

        tracing::info!(id = %id, "Transaction removed, undo window open");
        self.emit(LedgerEvent::TransactionRemoved {
            transaction: removed.clone(),
            undo_window_ms: u64::try_from(self.undo.window().as_millis()).unwrap_or(u64::MAX),
            occurred_at: Utc::now(),
        });
        Ok(removed)
    }

    /// Put a removed transaction back.
    ///
    /// Best effort: returns `Ok(false)` without touching anything if the
    /// ledger was reset after the removal or the id is already active.
    pub fn restore(&mut self, deleted: DeletedTransaction) -> AppResult<bool> {
        if deleted.epoch() != self.epoch {
            tracing::debug!(id = %deleted.transaction().id(), "Ledger was reset since removal, not restoring");
            return Ok(false);
        }
        if self.get(deleted.transaction().id()).is_some() {
            tracing::debug!(id = %deleted.transaction().id(), "Transaction already active, not restoring");
            return Ok(false);
        }

        let transaction = deleted.into_transaction();
        let mut next = self.transactions.clone();
        next.push(transaction.clone());
        self.commit(next)?;

        tracing::info!(id = %transaction.id(), "Transaction restored");
        self.emit(LedgerEvent::TransactionRestored {
            transaction,
            occurred_at: Utc::now(),
        });
        Ok(true)
    }

    /// Restore the pending deletion, if its window is still open.
    ///
    /// # Errors
    /// `DomainError::NoPendingDeletion` if there is nothing to undo.
    pub fn undo(&mut self) -> AppResult<Transaction> {
        let deleted = self.undo.restore()?;
        let transaction = deleted.transaction().clone();

        if let Err(e) = self.restore(deleted.clone()) {
            // Offer it again rather than losing it to a failed write
            self.undo.initiate(deleted);
            return Err(e);
        }
        Ok(transaction)
    }

    /// Discard every transaction and any pending deletion.
    pub fn reset(&mut self) -> AppResult<()> {
        self.store.clear()?;

        let discarded = self.transactions.len();
        self.transactions.clear();
        self.undo.clear();
        self.epoch += 1;

        tracing::warn!(discarded, "Ledger reset");
        self.emit(LedgerEvent::LedgerReset {
            discarded,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Totals of the active transactions, computed on every call
    pub fn aggregates(&self) -> Aggregates {
        Aggregates::from_transactions(&self.transactions)
    }

    /// Active transactions in display order (newest first)
    pub fn transactions(&self) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by(|a, b| b.id().cmp(&a.id()));
        sorted
    }

    /// Owned copy of the active transactions in display order
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions().into_iter().cloned().collect()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The deletion that can currently be undone
    pub fn pending_deletion(&self) -> Option<Transaction> {
        self.undo.pending()
    }

    pub fn undo_controller(&self) -> &UndoController {
        &self.undo
    }

    pub fn undo_controller_mut(&mut self) -> &mut UndoController {
        &mut self.undo
    }

    /// Receive an event after every change (the re-render signal)
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position(&self, id: TransactionId) -> Result<usize, DomainError> {
        self.transactions
            .iter()
            .position(|t| t.id() == id)
            .ok_or(DomainError::NotFound(id))
    }

    fn commit(&mut self, next: Vec<Transaction>) -> Result<(), StoreError> {
        self.store.save(&next)?;
        self.transactions = next;
        Ok(())
    }

    fn emit(&self, event: LedgerEvent) {
        tracing::debug!(event_type = event.event_type(), "Ledger event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn validate(text: &str, amount: Decimal) -> Result<(Description, Amount), DomainError> {
    let text = Description::new(text)?;
    let amount = Amount::new(amount)?;
    Ok((text, amount))
}

/// Keep the first record of each id
fn dedupe(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let before = transactions.len();
    let unique: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| seen.insert(t.id()))
        .collect();
    if unique.len() != before {
        tracing::warn!(dropped = before - unique.len(), "Dropped transactions with duplicate ids");
    }
    unique
}
