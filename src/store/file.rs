//! File-backed snapshot store
//!
//! Keeps the snapshot as one JSON file. Writes go to a sibling temp file that
//! is then renamed over the slot, so a crash never leaves half a snapshot.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::domain::Transaction;

use super::{decode, encode, SnapshotStore, StoreError};

/// Snapshot store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the file at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| super::SNAPSHOT_KEY.into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Where a corrupt snapshot is moved by [`SnapshotStore::quarantine`]
    pub fn quarantine_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Vec<Transaction>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => decode(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No snapshot file, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &[Transaction]) -> Result<(), StoreError> {
        let bytes = encode(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.sibling(".tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            transactions = snapshot.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn quarantine(&self) -> Result<(), StoreError> {
        let target = self.quarantine_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => {
                tracing::warn!(
                    from = %self.path.display(),
                    to = %target.display(),
                    "Moved corrupt snapshot aside"
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amount, Description, TransactionId};
    use rust_decimal_macros::dec;

    fn rent() -> Transaction {
        Transaction::new(
            TransactionId::from_millis(1_700_000_000_000),
            Description::new("Rent").unwrap(),
            Amount::new(dec!(-1200)).unwrap(),
        )
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("transactions.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/transactions.json"));

        store.save(&[rent()]).unwrap();
        assert_eq!(store.load().unwrap(), vec![rent()]);
        assert!(!store.sibling(".tmp").exists());
    }

    #[test]
    fn test_save_replaces_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("transactions.json"));

        store.save(&[rent()]).unwrap();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("transactions.json"));

        store.save(&[rent()]).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_reported_and_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("transactions.json"));
        fs::write(store.path(), b"[{\"id\": 1,").unwrap();

        assert!(store.load().unwrap_err().is_corrupt());

        store.quarantine().unwrap();
        assert!(!store.path().exists());
        assert_eq!(fs::read(store.quarantine_path()).unwrap(), b"[{\"id\": 1,");
        assert!(store.load().unwrap().is_empty());
    }
}
