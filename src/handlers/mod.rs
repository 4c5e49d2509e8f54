//! Handlers module
//!
//! Entry points for the presentation layer. Each handler turns raw user
//! input into ledger operations.

mod commands;
mod ledger_handler;


pub use commands::*;
pub use ledger_handler::LedgerService;
