//! Store Errors
//!
//! Error types for snapshot persistence.

/// Errors that can occur while reading or writing the snapshot slot
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying storage failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Slot exists but does not hold a valid snapshot
    #[error("Stored snapshot is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Check if the stored data itself is unreadable
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt(_))
    }
}
