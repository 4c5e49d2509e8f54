//! Ledger Handler
//!
//! The operation set the presentation layer calls into. Input arrives as raw
//! text; anything that fails to parse or validate is rejected before the
//! ledger is touched.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::{Amount, DomainError, LedgerEvent, Transaction, TransactionId};
use crate::error::AppResult;
use crate::export::{self, CsvExporter, ExportError};
use crate::ledger::Ledger;
use crate::store::FileStore;

use super::{EditTransactionCommand, ExportResult, LedgerView, NewTransactionCommand};

/// Handler for every user intent on the ledger
#[derive(Debug)]
pub struct LedgerService {
    ledger: Ledger,
    export_dir: PathBuf,
    currency_symbol: String,
}

impl LedgerService {
    pub fn new(ledger: Ledger, config: &Config) -> Self {
        Self {
            ledger,
            export_dir: config.export_dir.clone(),
            currency_symbol: config.currency_symbol.clone(),
        }
    }

    /// Open the file-backed ledger described by `config`
    pub fn open(config: &Config) -> AppResult<Self> {
        let store = FileStore::new(&config.store_path);
        let ledger = Ledger::open(store, &config.ledger_options())?;
        Ok(Self::new(ledger, config))
    }

    /// Record a new transaction from form input
    pub fn submit_new(&mut self, command: NewTransactionCommand) -> AppResult<Transaction> {
        let amount = parse_amount(&command.amount)?;
        self.ledger.add(&command.text, amount.value())
    }

    /// Change an existing transaction from form input
    pub fn submit_edit(&mut self, command: EditTransactionCommand) -> AppResult<Transaction> {
        let amount = parse_amount(&command.amount)?;
        self.ledger.update(command.id, &command.text, amount.value())
    }

    /// Delete a transaction; it stays restorable for the undo window
    pub fn request_delete(&mut self, id: TransactionId) -> AppResult<Transaction> {
        self.ledger.remove(id)
    }

    /// Bring back the most recent deletion
    pub fn request_undo(&mut self) -> AppResult<Transaction> {
        self.ledger.undo()
    }

    /// Reset the ledger if `confirm` agrees. Returns whether it was reset.
    pub fn request_reset<F>(&mut self, confirm: F) -> AppResult<bool>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            tracing::debug!("Reset not confirmed");
            return Ok(false);
        }
        self.ledger.reset()?;
        Ok(true)
    }

    /// CSV text of the ledger in display order
    pub fn export_text(&self) -> AppResult<String> {
        let csv = CsvExporter::new(Local)
            .with_currency_symbol(self.currency_symbol.as_str())
            .format(&self.ledger.snapshot())?;
        Ok(csv)
    }

    /// Write the CSV export into the export directory
    pub fn request_export(&self) -> AppResult<ExportResult> {
        let csv = self.export_text()?;
        let path = self
            .export_dir
            .join(export::file_name(Utc::now().date_naive()));

        write_export(&self.export_dir, &path, &csv)?;

        let rows = self.ledger.len();
        tracing::info!(path = %path.display(), rows, "Ledger exported");
        Ok(ExportResult { path, rows })
    }

    /// Current state for rendering
    pub fn view(&self) -> LedgerView {
        LedgerView {
            transactions: self.ledger.snapshot(),
            aggregates: self.ledger.aggregates().rounded(),
            pending_deletion: self.ledger.pending_deletion(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.ledger.subscribe()
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
}

fn parse_amount(input: &str) -> Result<Amount, DomainError> {
    Ok(input.parse::<Amount>()?)
}

fn write_export(dir: &Path, path: &Path, csv: &str) -> Result<(), ExportError> {
    fs::create_dir_all(dir)?;
    fs::write(path, csv)?;
    Ok(())
}
