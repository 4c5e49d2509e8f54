//! Common test utilities

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use zenith_ledger::store::FileStore;
use zenith_ledger::{Config, Ledger, LedgerOptions, LedgerService};

/// A scratch directory holding the snapshot file and exports
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("transactions.json")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.dir.path().join("exports")
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(self.store_path())
    }

    /// Open (or reopen) the file-backed ledger
    pub fn open_ledger(&self) -> Ledger {
        Ledger::open(self.store(), &options(Duration::from_secs(5))).expect("Failed to open ledger")
    }

    /// Config pointing at this directory
    pub fn config(&self) -> Config {
        let store_path = self.store_path();
        let export_dir = self.export_dir();
        Config::from_lookup(|key| match key {
            "LEDGER_STORE_PATH" => Some(store_path.display().to_string()),
            "EXPORT_DIR" => Some(export_dir.display().to_string()),
            _ => None,
        })
        .expect("Failed to build config")
    }

    pub fn open_service(&self) -> LedgerService {
        LedgerService::open(&self.config()).expect("Failed to open service")
    }

    /// Raw contents of the snapshot file
    pub fn snapshot_json(&self) -> serde_json::Value {
        let bytes = std::fs::read(self.store_path()).expect("Failed to read snapshot");
        serde_json::from_slice(&bytes).expect("Snapshot is not JSON")
    }
}

pub fn options(undo_window: Duration) -> LedgerOptions {
    LedgerOptions {
        undo_window,
        recover_corrupt: true,
    }
}
