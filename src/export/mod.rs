//! CSV export
//!
//! Renders a ledger snapshot as a spreadsheet-friendly CSV document: a
//! human-facing summary block, a blank line, then one row per transaction.
//!
//! Fields containing a comma, a double quote or a line break are quoted with
//! inner quotes doubled; everything else is written as is. Amount cells are
//! plain signed decimals so they stay machine-parseable.

use chrono::{Local, NaiveDate, TimeZone};
use csv::{Terminator, WriterBuilder};

use crate::domain::{format_money, Aggregates, Transaction};

/// Header of the transaction table
pub const HEADER: [&str; 4] = ["DateTime (Sortable)", "Description", "Amount", "Type"];

/// Title line of the summary block
pub const SUMMARY_TITLE: &str = "Financial Summary";

/// Symbol used when none is configured
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Errors that can occur while exporting
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Nothing to export
    #[error("No transactions to export")]
    EmptyLedger,

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn is_empty_ledger(&self) -> bool {
        matches!(self, ExportError::EmptyLedger)
    }
}

/// Formats snapshots as CSV, rendering dates in `Tz`.
#[derive(Debug, Clone)]
pub struct CsvExporter<Tz: TimeZone> {
    timezone: Tz,
    currency_symbol: String,
}

impl Default for CsvExporter<Local> {
    fn default() -> Self {
        Self::new(Local)
    }
}

impl<Tz: TimeZone> CsvExporter<Tz> {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Render `snapshot` in the order given.
    ///
    /// # Errors
    /// `ExportError::EmptyLedger` if `snapshot` is empty.
    pub fn format(&self, snapshot: &[Transaction]) -> Result<String, ExportError> {
        if snapshot.is_empty() {
            return Err(ExportError::EmptyLedger);
        }

        let aggregates = Aggregates::from_transactions(snapshot);
        let mut out = Vec::new();

        {
            // Summary rows have fewer columns than the table
            let mut summary = WriterBuilder::new()
                .flexible(true)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(&mut out);
            summary.write_record([SUMMARY_TITLE])?;
            summary.write_record(["Total Income", self.money(&aggregates.income).as_str()])?;
            summary.write_record(["Total Expense", self.money(&aggregates.expense).as_str()])?;
            summary.write_record(["Final Balance", self.money(&aggregates.total).as_str()])?;
            summary.flush()?;
        }
        out.push(b'\n');

        {
            let mut table = WriterBuilder::new()
                .terminator(Terminator::Any(b'\n'))
                .from_writer(&mut out);
            table.write_record(HEADER)?;
            for transaction in snapshot {
                table.write_record([
                    self.date_time(transaction).as_str(),
                    transaction.text(),
                    transaction.amount().to_string().as_str(),
                    transaction.kind().as_str(),
                ])?;
            }
            table.flush()?;
        }
        // Rows are joined by newlines; the last one has no terminator
        if out.last() == Some(&b'\n') {
            out.pop();
        }

        // Every field came from a &str
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn money(&self, value: &rust_decimal::Decimal) -> String {
        format_money(&self.currency_symbol, *value)
    }

    /// Creation time as `YYYY-MM-DD HH:MM`
    fn date_time(&self, transaction: &Transaction) -> String {
        let millis = transaction.id().as_millis();
        match self.timezone.timestamp_millis_opt(millis).single() {
            Some(at) => at.naive_local().format("%Y-%m-%d %H:%M").to_string(),
            None => millis.to_string(),
        }
    }
}

/// Render `snapshot` with dates in the local time zone.
pub fn format(snapshot: &[Transaction]) -> Result<String, ExportError> {
    CsvExporter::default().format(snapshot)
}

/// File name for an export made on `date`, e.g. `Zenith_Finance_Export_2026-10-17.csv`
pub fn file_name(date: NaiveDate) -> String {
    format!("Zenith_Finance_Export_{}.csv", date.format("%Y-%m-%d"))
}
