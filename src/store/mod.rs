//! Store module
//!
//! Persistence for the ledger snapshot. The whole transaction list lives in a
//! single slot and is rewritten on every mutation; there are no partial
//! updates and no versioning.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::domain::Transaction;

/// Well-known name of the snapshot slot
pub const SNAPSHOT_KEY: &str = "transactions";

/// Durable single-slot storage for the ledger snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Read the snapshot. A missing slot is an empty snapshot; an unreadable
    /// one is `StoreError::Corrupt`.
    fn load(&self) -> Result<Vec<Transaction>, StoreError>;

    /// Replace the slot with `snapshot`
    fn save(&self, snapshot: &[Transaction]) -> Result<(), StoreError>;

    /// Remove the slot entirely
    fn clear(&self) -> Result<(), StoreError>;

    /// Move an unreadable slot out of the way so it is kept for inspection
    /// but no longer loaded
    fn quarantine(&self) -> Result<(), StoreError>;
}

/// Encode a snapshot as a JSON array of `{id, text, amount}` records
pub fn encode(snapshot: &[Transaction]) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Decode a snapshot. Blank input counts as an empty slot.
pub fn decode(bytes: &[u8]) -> Result<Vec<Transaction>, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    // `null` reads the same as a missing slot
    let value: Option<Vec<Transaction>> =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(value.unwrap_or_default())
}
