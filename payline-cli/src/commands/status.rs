//! Status command - ledger summary

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::get_context;
use crate::output;

#[derive(Serialize)]
struct StatusSummary {
    accounts: i64,
    transfers: i64,
    pending_claims: i64,
    settled_claims: i64,
}

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;

    let (pending, settled) = ctx.repository.get_claim_counts()?;
    let summary = StatusSummary {
        accounts: ctx.repository.get_account_count()?,
        transfers: ctx.repository.get_transfer_count()?,
        pending_claims: pending,
        settled_claims: settled,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Ledger Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Accounts", &summary.accounts.to_string()]);
    table.add_row(vec!["Transfers", &summary.transfers.to_string()]);
    table.add_row(vec!["Pending claims", &summary.pending_claims.to_string()]);
    table.add_row(vec!["Settled claims", &summary.settled_claims.to_string()]);
    println!("{table}");

    Ok(())
}
