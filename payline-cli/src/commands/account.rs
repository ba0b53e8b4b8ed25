//! Account commands - open accounts, list them, check balances

use anyhow::Result;
use clap::Subcommand;

use payline_core::services::LogEvent;

use super::{get_context, get_logger, log_event, parse_id, resolve_caller};
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    New {
        /// Display name of the account holder
        name: String,
        /// Open the account with administrative rights
        #[arg(long)]
        admin: bool,
    },

    /// List all accounts (admin)
    List {
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an account balance
    Balance {
        /// Account to inspect (defaults to the acting account)
        account_id: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },
}

pub fn run(command: AccountCommands) -> Result<()> {
    let logger = get_logger();
    match command {
        AccountCommands::New { name, admin } => {
            let ctx = get_context()?;
            let account = ctx.account_service.open_account(&name, admin)?;
            log_event(
                &logger,
                LogEvent::new("account_opened").with_entity(account.id.to_string()),
            );
            output::success(&format!("Opened account {} ({})", account.name, account.id));
            if admin {
                output::info("Account has administrative rights");
            }
            Ok(())
        }
        AccountCommands::List { actor, json } => {
            let ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;
            let accounts = ctx.account_service.list_accounts(&caller)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["ID", "Name", "Admin", "Balance"]);
            for account in &accounts {
                table.add_row(vec![
                    account.id.to_string(),
                    account.name.clone(),
                    if account.is_admin { "yes" } else { "" }.to_string(),
                    output::format_amount(account.balance),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        AccountCommands::Balance { account_id, actor } => {
            let ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;
            let target = match account_id {
                Some(raw) => parse_id(&raw, "account")?,
                None => caller.account_id,
            };
            let balance = ctx.account_service.get_balance(&caller, target)?;
            println!("{}", output::format_amount(balance));
            Ok(())
        }
    }
}
