//! Undo Controller
//!
//! Holds at most one pending deletion together with its expiry deadline.
//! The deadline is authoritative: once it has passed the deletion can no
//! longer be restored, whether or not the expiry timer has run yet. The timer
//! (a tokio task) only discards the pending record eagerly and announces it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::{DomainError, LedgerEvent, Transaction, TransactionId};

/// How long a deletion stays restorable unless configured otherwise
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

/// A transaction taken out of the ledger, restorable while its window is open.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedTransaction {
    transaction: Transaction,
    /// Reset epoch of the ledger at removal time
    epoch: u64,
}

impl DeletedTransaction {
    pub(crate) fn new(transaction: Transaction, epoch: u64) -> Self {
        Self { transaction, epoch }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug)]
struct PendingDeletion {
    deleted: DeletedTransaction,
    deadline: Instant,
    seq: u64,
}

type Slot = Arc<Mutex<Option<PendingDeletion>>>;

/// Single-slot undo state: `Idle` when the slot is empty, `Pending` otherwise.
#[derive(Debug)]
pub struct UndoController {
    window: Duration,
    slot: Slot,
    timer: Option<JoinHandle<()>>,
    seq: u64,
    events: Option<broadcast::Sender<LedgerEvent>>,
}

impl UndoController {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: Arc::new(Mutex::new(None)),
            timer: None,
            seq: 0,
            events: None,
        }
    }

    /// Announce expiries on this channel
    pub fn with_events(mut self, events: broadcast::Sender<LedgerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Make `deleted` the pending deletion and (re)start the window.
    ///
    /// Returns the transaction that was pending before, which is now
    /// discarded for good.
    pub fn initiate(&mut self, deleted: DeletedTransaction) -> Option<Transaction> {
        self.cancel_timer();
        self.seq += 1;

        let deadline = Instant::now() + self.window;
        let id = deleted.transaction().id();
        let superseded = lock(&self.slot)
            .replace(PendingDeletion {
                deleted,
                deadline,
                seq: self.seq,
            })
            .map(|previous| previous.deleted.into_transaction());

        if let Some(previous) = &superseded {
            tracing::info!(
                id = %previous.id(),
                "Pending deletion superseded, discarded permanently"
            );
        }
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(id = %id, window_ms, "Undo window opened");

        self.schedule_expiry(self.seq, deadline);
        superseded
    }

    /// Take back the pending deletion.
    ///
    /// # Errors
    /// `DomainError::NoPendingDeletion` if nothing is pending or the window
    /// has already closed.
    pub fn restore(&mut self) -> Result<DeletedTransaction, DomainError> {
        self.cancel_timer();
        let pending = lock(&self.slot)
            .take()
            .ok_or(DomainError::NoPendingDeletion)?;

        if Instant::now() >= pending.deadline {
            self.announce_expired(pending.deleted.transaction().id());
            return Err(DomainError::NoPendingDeletion);
        }

        tracing::debug!(id = %pending.deleted.transaction().id(), "Pending deletion taken back");
        Ok(pending.deleted)
    }

    /// Discard the pending deletion if its window has closed.
    ///
    /// Only needed where no tokio runtime drives the timer; with a runtime
    /// the timer does this on its own.
    pub fn expire_due(&mut self) -> Option<TransactionId> {
        let expired = {
            let mut slot = lock(&self.slot);
            match slot.as_ref() {
                Some(pending) if Instant::now() >= pending.deadline => slot.take(),
                _ => None,
            }
        }?;

        self.cancel_timer();
        let id = expired.deleted.transaction().id();
        self.announce_expired(id);
        Some(id)
    }

    /// Drop the pending deletion unconditionally and stop the timer
    pub fn clear(&mut self) -> Option<Transaction> {
        self.cancel_timer();
        lock(&self.slot)
            .take()
            .map(|pending| pending.deleted.into_transaction())
    }

    /// Whether a deletion is still restorable
    pub fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }

    /// The restorable transaction, if any
    pub fn pending(&self) -> Option<Transaction> {
        lock(&self.slot)
            .as_ref()
            .filter(|pending| Instant::now() < pending.deadline)
            .map(|pending| pending.deleted.transaction().clone())
    }

    /// When the open window closes
    pub fn deadline(&self) -> Option<Instant> {
        lock(&self.slot)
            .as_ref()
            .map(|pending| pending.deadline)
            .filter(|deadline| Instant::now() < *deadline)
    }

    /// Time left in the open window
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn schedule_expiry(&mut self, seq: u64, deadline: Instant) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No tokio runtime, undo window enforced by deadline only");
            return;
        };

        let slot = Arc::clone(&self.slot);
        let events = self.events.clone();
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let expired = {
                let mut slot = lock(&slot);
                match slot.as_ref() {
                    Some(pending) if pending.seq == seq => slot.take(),
                    _ => None,
                }
            };

            if let Some(pending) = expired {
                let id = pending.deleted.transaction().id();
                tracing::info!(id = %id, "Undo window expired, deletion is final");
                notify_expired(events.as_ref(), id);
            }
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn announce_expired(&self, id: TransactionId) {
        tracing::info!(id = %id, "Undo window expired, deletion is final");
        notify_expired(self.events.as_ref(), id);
    }
}

impl Default for UndoController {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl Drop for UndoController {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn notify_expired(events: Option<&broadcast::Sender<LedgerEvent>>, id: TransactionId) {
    if let Some(events) = events {
        // No subscribers is fine
        let _ = events.send(LedgerEvent::PendingDeletionExpired {
            transaction_id: id,
            occurred_at: Utc::now(),
        });
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, Option<PendingDeletion>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amount, Description};
    use rust_decimal_macros::dec;
    use tokio::sync::broadcast::error::TryRecvError;

    fn deleted(id: i64, text: &str) -> DeletedTransaction {
        DeletedTransaction::new(
            Transaction::new(
                TransactionId::from_millis(id),
                Description::new(text).unwrap(),
                Amount::new(dec!(-10)).unwrap(),
            ),
            0,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_initiate_then_restore() {
        let mut undo = UndoController::default();
        assert!(undo.initiate(deleted(1, "Coffee")).is_none());
        assert!(undo.is_pending());
        assert_eq!(undo.remaining(), Some(DEFAULT_UNDO_WINDOW));

        let restored = undo.restore().unwrap();
        assert_eq!(restored.transaction().text(), "Coffee");
        assert!(!undo.is_pending());
    }

    #[test]
    fn test_restore_when_idle() {
        let mut undo = UndoController::default();
        assert_eq!(undo.restore(), Err(DomainError::NoPendingDeletion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_deletion_supersedes_previous() {
        let mut undo = UndoController::default();
        undo.initiate(deleted(1, "A"));

        let superseded = undo.initiate(deleted(2, "B")).unwrap();
        assert_eq!(superseded.text(), "A");

        assert_eq!(undo.restore().unwrap().transaction().text(), "B");
        assert_eq!(undo.restore(), Err(DomainError::NoPendingDeletion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_expires_pending_deletion() {
        let (events, mut rx) = broadcast::channel(8);
        let mut undo = UndoController::new(Duration::from_secs(5)).with_events(events);
        undo.initiate(deleted(7, "Lunch"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "PendingDeletionExpired");
        assert_eq!(event.transaction_id(), Some(TransactionId::from_millis(7)));

        assert!(!undo.is_pending());
        assert!(undo.pending().is_none());
        assert_eq!(undo.restore(), Err(DomainError::NoPendingDeletion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_inside_window_cancels_timer() {
        let (events, mut rx) = broadcast::channel(8);
        let mut undo = UndoController::new(Duration::from_secs(5)).with_events(events);
        undo.initiate(deleted(7, "Lunch"));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(undo.restore().is_ok());

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_does_not_expire_newer_deletion() {
        let mut undo = UndoController::new(Duration::from_secs(5));
        undo.initiate(deleted(1, "A"));

        tokio::time::advance(Duration::from_secs(3)).await;
        undo.initiate(deleted(2, "B"));

        // A's deadline has passed, B still has two seconds left
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(undo.pending().map(|t| t.text().to_string()), Some("B".to_string()));
    }

    #[test]
    fn test_deadline_enforced_without_runtime() {
        let mut undo = UndoController::new(Duration::ZERO);
        undo.initiate(deleted(3, "Taxi"));

        assert!(!undo.is_pending());
        assert_eq!(undo.restore(), Err(DomainError::NoPendingDeletion));
    }

    #[test]
    fn test_expire_due_discards_closed_window() {
        let mut undo = UndoController::new(Duration::ZERO);
        undo.initiate(deleted(3, "Taxi"));

        assert_eq!(undo.expire_due(), Some(TransactionId::from_millis(3)));
        assert_eq!(undo.expire_due(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_pending() {
        let mut undo = UndoController::default();
        undo.initiate(deleted(4, "Books"));

        assert_eq!(undo.clear().map(|t| t.id()), Some(TransactionId::from_millis(4)));
        assert!(!undo.is_pending());
        assert!(undo.clear().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let (events, mut rx) = broadcast::channel(8);
        let mut undo = UndoController::new(Duration::from_secs(1)).with_events(events);
        undo.initiate(deleted(5, "Gift"));
        drop(undo);

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
