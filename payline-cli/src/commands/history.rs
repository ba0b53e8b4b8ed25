//! History command - show the transfers touching an account

use anyhow::Result;

use super::{get_context, parse_id, resolve_caller};
use crate::output;

pub fn run(
    account_id: Option<String>,
    all: bool,
    actor: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let caller = resolve_caller(&ctx, actor)?;

    let transfers = if all {
        ctx.ledger_service.all_transfers(&caller)?
    } else {
        let target = match account_id {
            Some(raw) => parse_id(&raw, "account")?,
            None => caller.account_id,
        };
        ctx.ledger_service.history(&caller, target)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&transfers)?);
        return Ok(());
    }

    if transfers.is_empty() {
        output::info("No transfers");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec![
        "ID", "From", "To", "Amount", "Kind", "Status", "Description", "Created",
    ]);
    for t in &transfers {
        table.add_row(vec![
            t.id.to_string(),
            t.from_account_id.to_string(),
            t.to_account_id.to_string(),
            output::format_amount(t.amount),
            t.kind.as_str().to_string(),
            t.status.as_str().to_string(),
            t.description.clone().unwrap_or_default(),
            t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
