//! CLI command implementations

pub mod account;
pub mod cancel;
pub mod deposit;
pub mod gateway;
pub mod history;
pub mod logs;
pub mod status;
pub mod transfer;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use payline_core::services::{EntryPoint, LogEvent, LoggingService};
use payline_core::{Caller, PaylineContext, Role};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let payline_dir = get_payline_dir();
    std::fs::create_dir_all(&payline_dir).ok()?;
    LoggingService::new(&payline_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the payline directory from environment or default
pub fn get_payline_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PAYLINE_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".payline")
    }
}

/// Get or create payline context
pub fn get_context() -> Result<PaylineContext> {
    let payline_dir = get_payline_dir();

    std::fs::create_dir_all(&payline_dir)
        .with_context(|| format!("Failed to create payline directory: {:?}", payline_dir))?;

    PaylineContext::new(&payline_dir).context("Failed to initialize payline context")
}

/// Resolve the acting caller for a command
///
/// The account id comes from --as or the PAYLINE_ACTOR environment
/// variable; the role is looked up from the account record, never taken
/// from the command line.
pub fn resolve_caller(ctx: &PaylineContext, actor: Option<String>) -> Result<Caller> {
    let raw = match actor.or_else(|| std::env::var("PAYLINE_ACTOR").ok()) {
        Some(raw) => raw,
        None => bail!("No acting account: pass --as <account-id> or set PAYLINE_ACTOR"),
    };
    let account_id = Uuid::parse_str(raw.trim())
        .with_context(|| format!("Invalid account id: {raw}"))?;

    let account = ctx.account_service.get_account(account_id)?;
    let role = if account.is_admin {
        Role::Admin
    } else {
        Role::Member
    };
    Ok(Caller { account_id, role })
}

/// Parse a uuid argument with a friendly error
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("Invalid {what} id: {raw}"))
}

/// Parse a monetary amount argument
pub fn parse_amount(raw: &str) -> Result<rust_decimal::Decimal> {
    rust_decimal::Decimal::from_str_exact(raw.trim())
        .with_context(|| format!("Invalid amount: {raw}"))
}
