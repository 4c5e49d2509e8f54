//! Zenith - personal finance ledger
//!
//! Interactive front end over the ledger service. Reads one command per line
//! from stdin and re-renders the ledger after every change.

use chrono::{Local, TimeZone};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zenith_ledger::domain::{format_money, format_signed_money};
use zenith_ledger::handlers::{EditTransactionCommand, NewTransactionCommand};
use zenith_ledger::{AppError, Config, LedgerEvent, LedgerService, TransactionId};

const HELP: &str = "\
Commands:
  add <amount> <description>        record income (positive) or expense (negative)
  edit <id> <amount> <description>  change a transaction
  delete <id>                       delete a transaction (undoable for a few seconds)
  undo                              restore the last deletion
  reset                             delete everything (asks first)
  export                            write a CSV export
  list                              show the ledger
  help                              show this help
  quit                              exit";

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zenith_ledger=info,zenith=info".into());

    // Logs go to stderr so they never interleave with the rendered ledger
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());

    tracing::info!(store = %config.store_path.display(), "Starting Zenith");
    let mut service = LedgerService::open(&config)?;
    let mut events = service.subscribe();

    println!("{HELP}");
    render(&service);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting_reset = false;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                if awaiting_reset {
                    awaiting_reset = false;
                    match service.request_reset(|| is_yes(&line)) {
                        Ok(true) => render(&service),
                        Ok(false) => println!("Reset cancelled."),
                        Err(e) => report(&e),
                    }
                    continue;
                }

                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Reset)) => {
                        println!("Delete ALL transactions? This cannot be undone. [y/N]");
                        awaiting_reset = true;
                    }
                    Ok(Some(command)) => execute(&mut service, command),
                    Err(usage) => println!("{usage}"),
                }
            }
            event = events.recv() => {
                match event {
                    Ok(LedgerEvent::PendingDeletionExpired { transaction_id, .. }) => {
                        println!("Undo window closed for #{transaction_id}.");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Render loop fell behind ledger events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = &mut shutdown => break,
        }
    }

    tracing::info!("Goodbye!");
    Ok(())
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Add { amount: String, text: String },
    Edit { id: TransactionId, amount: String, text: String },
    Delete(TransactionId),
    Undo,
    Reset,
    Export,
    List,
    Help,
    Quit,
}

/// Parse one input line. Blank lines parse to `None`.
///
/// Only the shape is checked here; amount and description are validated by
/// the service so that every rejection reads the same.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let Some((word, rest)) = split_word(line) else {
        return Ok(None);
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => {
            let (amount, text) = split_word(rest).ok_or("Usage: add <amount> <description>")?;
            Command::Add {
                amount: amount.to_string(),
                text: text.to_string(),
            }
        }
        "edit" => {
            let usage = "Usage: edit <id> <amount> <description>";
            let (id, rest) = split_word(rest).ok_or(usage)?;
            let (amount, text) = split_word(rest).ok_or(usage)?;
            Command::Edit {
                id: parse_id(id)?,
                amount: amount.to_string(),
                text: text.to_string(),
            }
        }
        "delete" | "del" | "rm" => {
            let (id, _) = split_word(rest).ok_or("Usage: delete <id>")?;
            Command::Delete(parse_id(id)?)
        }
        "undo" => Command::Undo,
        "reset" => Command::Reset,
        "export" | "download" => Command::Export,
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help' for a list.")),
    };
    Ok(Some(command))
}

/// First whitespace-delimited word and the trimmed remainder
fn split_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((input, "")),
    }
}

fn parse_id(input: &str) -> Result<TransactionId, String> {
    input
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{input}' is not a transaction id"))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn execute(service: &mut LedgerService, command: Command) {
    let result = match command {
        Command::Add { amount, text } => service
            .submit_new(NewTransactionCommand::new(text, amount))
            .map(|_| true),
        Command::Edit { id, amount, text } => service
            .submit_edit(EditTransactionCommand::new(id, text, amount))
            .map(|_| true),
        Command::Delete(id) => service.request_delete(id).map(|removed| {
            let window = service.ledger().undo_controller().window();
            println!(
                "Deleted '{}'. Type 'undo' within {}s to restore it.",
                removed.text(),
                window.as_secs_f32()
            );
            true
        }),
        Command::Undo => service.request_undo().map(|restored| {
            println!("Restored '{}'.", restored.text());
            true
        }),
        Command::Export => service.request_export().map(|export| {
            println!(
                "Exported {} transactions to {}",
                export.rows,
                export.path.display()
            );
            false
        }),
        Command::List => Ok(true),
        Command::Help => {
            println!("{HELP}");
            Ok(false)
        }
        // Handled by the input loop
        Command::Reset | Command::Quit => Ok(false),
    };

    match result {
        Ok(true) => render(service),
        Ok(false) => {}
        Err(e) => report(&e),
    }
}

fn report(error: &AppError) {
    println!("{}", error.user_message());
}

fn render(service: &LedgerService) {
    let view = service.view();
    let symbol = service.currency_symbol();

    println!();
    println!(
        "Balance {}   Income {}   Expense {}",
        format_money(symbol, view.aggregates.total),
        format_money(symbol, view.aggregates.income),
        format_money(symbol, view.aggregates.expense),
    );

    if view.transactions.is_empty() {
        println!("  No transactions yet.");
    }
    for transaction in &view.transactions {
        let when = Local
            .timestamp_millis_opt(transaction.id().as_millis())
            .single()
            .map(|at| at.format("%d-%b %I:%M %p").to_string())
            .unwrap_or_default();
        println!(
            "  #{:<14} {:<16} {:<30} {:>14}",
            transaction.id(),
            when,
            transaction.text(),
            format_signed_money(symbol, transaction.amount()),
        );
    }

    if let Some(pending) = view.pending_deletion {
        println!("  (undo available for '{}')", pending.text());
    }
    println!();
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
