//! Cancel command - reverse a completed transfer

use anyhow::Result;

use payline_core::services::LogEvent;

use super::{get_context, get_logger, log_event, parse_id, resolve_caller};
use crate::output;

pub fn run(transfer_id: &str, actor: Option<String>) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;
    let caller = resolve_caller(&ctx, actor)?;

    let transfer_id = parse_id(transfer_id, "transfer")?;
    let (cancelled, refund) = ctx.ledger_service.cancel_transfer(&caller, transfer_id)?;

    log_event(
        &logger,
        LogEvent::new("transfer_cancelled")
            .with_entity(cancelled.id.to_string())
            .with_command("cancel"),
    );
    output::success(&format!(
        "Cancelled transfer {} ({} returned, refund {})",
        cancelled.id,
        output::format_amount(refund.amount),
        refund.id
    ));
    Ok(())
}
