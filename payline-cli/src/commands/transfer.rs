//! Transfer commands - send funds between accounts, grant funds as admin
//!
//! The overdraft check lives here, not in the ledger: `pl send` refuses
//! to route a transfer the sender cannot cover, while the ledger itself
//! records whatever an authorized caller asks of it.

use anyhow::{bail, Result};

use payline_core::services::LogEvent;
use payline_core::TransferKind;

use super::{get_context, get_logger, log_event, parse_amount, parse_id, resolve_caller};
use crate::output;

pub fn send(
    to: &str,
    amount: &str,
    from: Option<String>,
    description: Option<String>,
    actor: Option<String>,
) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;
    let caller = resolve_caller(&ctx, actor)?;

    let to = parse_id(to, "account")?;
    let from = match from {
        Some(raw) => parse_id(&raw, "account")?,
        None => caller.account_id,
    };
    let amount = parse_amount(amount)?;

    // Refuse to route a transfer the sender cannot cover
    let available = ctx.account_service.get_balance(&caller, from)?;
    if available < amount {
        bail!(
            "Insufficient funds: balance is {}, tried to send {}",
            output::format_amount(available),
            output::format_amount(amount)
        );
    }

    let record = ctx.ledger_service.record_transfer(
        &caller,
        from,
        to,
        amount,
        TransferKind::Transfer,
        description,
    )?;

    log_event(
        &logger,
        LogEvent::new("transfer_recorded")
            .with_entity(record.id.to_string())
            .with_command("send"),
    );
    output::success(&format!(
        "Sent {} to {} (transfer {})",
        output::format_amount(record.amount),
        to,
        record.id
    ));
    Ok(())
}

pub fn grant(
    to: &str,
    amount: &str,
    description: Option<String>,
    actor: Option<String>,
) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;
    let caller = resolve_caller(&ctx, actor)?;

    let to = parse_id(to, "account")?;
    let amount = parse_amount(amount)?;

    let record = ctx.ledger_service.record_transfer(
        &caller,
        caller.account_id,
        to,
        amount,
        TransferKind::AdminGrant,
        description,
    )?;

    log_event(
        &logger,
        LogEvent::new("grant_recorded")
            .with_entity(record.id.to_string())
            .with_command("grant"),
    );
    output::success(&format!(
        "Granted {} to {} (transfer {})",
        output::format_amount(record.amount),
        to,
        record.id
    ));
    Ok(())
}
