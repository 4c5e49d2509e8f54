//! In-memory snapshot store
//!
//! Holds the encoded snapshot in a shared buffer. Clones share the same slot,
//! so a test can keep a handle while the ledger owns another.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::Transaction;

use super::{decode, encode, SnapshotStore, StoreError};

#[derive(Debug, Default)]
struct Slots {
    current: Option<Vec<u8>>,
    quarantined: Option<Vec<u8>>,
}

/// Snapshot store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<Slots>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw bytes in the slot (which need not be a valid snapshot)
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.lock().current = Some(bytes.into());
        store
    }

    /// Raw contents of the slot
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.lock().current.clone()
    }

    /// Raw contents moved aside by the last quarantine
    pub fn quarantined(&self) -> Option<Vec<u8>> {
        self.lock().quarantined.clone()
    }

    /// Make every subsequent save/clear fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "memory store is read-only",
            )));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Vec<Transaction>, StoreError> {
        match &self.lock().current {
            Some(bytes) => decode(bytes),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, snapshot: &[Transaction]) -> Result<(), StoreError> {
        self.check_writable()?;
        let bytes = encode(snapshot)?;
        self.lock().current = Some(bytes);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.lock().current = None;
        Ok(())
    }

    fn quarantine(&self) -> Result<(), StoreError> {
        let mut slots = self.lock();
        if let Some(bytes) = slots.current.take() {
            slots.quarantined = Some(bytes);
        }
        Ok(())
    }
}
