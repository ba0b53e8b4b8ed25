//! Deposit commands - file, list, and settle deposit claims

use anyhow::Result;
use clap::Subcommand;

use payline_core::services::LogEvent;
use payline_core::FundingMethod;

use super::{get_context, get_logger, log_event, parse_amount, parse_id, resolve_caller};
use crate::output;

#[derive(Subcommand)]
pub enum DepositCommands {
    /// File a bank-transfer deposit claim
    File {
        /// Amount claimed to arrive
        amount: String,
        /// Account to credit (defaults to the acting account)
        #[arg(long)]
        account: Option<String>,
        /// Free-text comment or wire reference
        #[arg(long)]
        comment: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },

    /// List deposit claims
    List {
        /// Show one account's claims instead of all (all requires admin)
        #[arg(long)]
        account: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Settle a pending claim manually (admin)
    Settle {
        /// Claim to settle
        claim_id: String,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },
}

pub fn run(command: DepositCommands) -> Result<()> {
    let logger = get_logger();
    match command {
        DepositCommands::File {
            amount,
            account,
            comment,
            actor,
        } => {
            let ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;
            let account_id = match account {
                Some(raw) => parse_id(&raw, "account")?,
                None => caller.account_id,
            };
            let amount = parse_amount(&amount)?;

            let claim = ctx.deposit_service.file_claim(
                &caller,
                account_id,
                amount,
                FundingMethod::BankTransfer,
                comment,
            )?;
            log_event(
                &logger,
                LogEvent::new("claim_filed")
                    .with_entity(claim.id.to_string())
                    .with_command("deposit file"),
            );
            output::success(&format!(
                "Filed claim {} for {} (pending settlement)",
                claim.id,
                output::format_amount(claim.amount)
            ));
            Ok(())
        }
        DepositCommands::List {
            account,
            actor,
            json,
        } => {
            let ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;
            let claims = match account {
                Some(raw) => {
                    let account_id = parse_id(&raw, "account")?;
                    ctx.deposit_service.claims_for_account(&caller, account_id)?
                }
                None => ctx.deposit_service.list_claims(&caller)?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&claims)?);
                return Ok(());
            }

            if claims.is_empty() {
                output::info("No deposit claims");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["ID", "Account", "Amount", "Method", "Status", "Comment"]);
            for claim in &claims {
                table.add_row(vec![
                    claim.id.to_string(),
                    claim.account_id.to_string(),
                    output::format_amount(claim.amount),
                    claim.method.as_str().to_string(),
                    claim.status.as_str().to_string(),
                    claim.comment.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        DepositCommands::Settle { claim_id, actor } => {
            let ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;
            let claim_id = parse_id(&claim_id, "claim")?;

            let (claim, new_balance) = ctx.deposit_service.settle_claim(&caller, claim_id)?;
            log_event(
                &logger,
                LogEvent::new("claim_settled")
                    .with_entity(claim.id.to_string())
                    .with_command("deposit settle"),
            );
            output::success(&format!(
                "Settled claim {}: credited {}, new balance {}",
                claim.id,
                output::format_amount(claim.amount),
                output::format_amount(new_balance)
            ));
            Ok(())
        }
    }
}
