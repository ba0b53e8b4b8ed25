//! Gateway commands - checkout URLs, webhook handling, credentials

use anyhow::Result;
use clap::Subcommand;

use payline_core::services::{EntryPoint, LogEvent, LoggingService, WebhookNotification};
use payline_core::{Error, FundingMethod};

use super::{
    get_context, get_logger, get_payline_dir, log_event, parse_amount, parse_id, resolve_caller,
};
use crate::output;

#[derive(Subcommand)]
pub enum GatewayCommands {
    /// Show the configured gateway credentials (admin)
    Show {
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },

    /// Set gateway credentials (admin)
    Set {
        #[arg(long)]
        merchant_id: Option<String>,
        #[arg(long)]
        webhook_secret: Option<String>,
        #[arg(long)]
        checkout_secret: Option<String>,
        #[arg(long)]
        checkout_base_url: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },
}

/// `pl pay` - file a gateway claim and print its signed checkout URL
pub fn pay(amount: &str, account: Option<String>, actor: Option<String>) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;
    let caller = resolve_caller(&ctx, actor)?;
    let account_id = match account {
        Some(raw) => parse_id(&raw, "account")?,
        None => caller.account_id,
    };
    let amount = parse_amount(amount)?;

    let claim = ctx.deposit_service.file_claim(
        &caller,
        account_id,
        amount,
        FundingMethod::Gateway,
        None,
    )?;
    let url = ctx.gateway.build_payment_url(&claim)?;

    log_event(
        &logger,
        LogEvent::new("checkout_created")
            .with_entity(claim.id.to_string())
            .with_command("pay"),
    );
    output::info(&format!("Claim {} filed, complete payment at:", claim.id));
    println!("{url}");
    Ok(())
}

/// `pl webhook` - process an inbound settlement notification
///
/// Prints "YES" on success, the acknowledgement string the gateway
/// expects. A bad signature exits non-zero without touching the ledger.
pub fn webhook(merchant: &str, amount: &str, claim: &str, signature: &str) -> Result<()> {
    let payline_dir = get_payline_dir();
    std::fs::create_dir_all(&payline_dir)?;
    let logger =
        LoggingService::new(&payline_dir, EntryPoint::Webhook, env!("CARGO_PKG_VERSION")).ok();

    let ctx = get_context()?;
    let note = WebhookNotification {
        merchant_id: merchant.to_string(),
        amount: amount.to_string(),
        claim_id: claim.to_string(),
        signature: signature.to_string(),
    };

    match ctx.gateway.handle_webhook(&note) {
        Ok((settled, new_balance)) => {
            log_event(
                &logger,
                LogEvent::new("claim_settled").with_entity(settled.id.to_string()),
            );
            eprintln!(
                "Settled claim {}: new balance {}",
                settled.id,
                output::format_amount(new_balance)
            );
            println!("YES");
            Ok(())
        }
        Err(Error::SignatureMismatch) => {
            if let Some(l) = &logger {
                let _ = l.log_error("webhook_rejected", "signature mismatch", None);
            }
            eprintln!("Bad signature");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

pub fn run(command: GatewayCommands) -> Result<()> {
    match command {
        GatewayCommands::Show { actor } => {
            let ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;
            let settings = ctx.gateway.settings(&caller)?;
            if !settings.is_configured() {
                output::warning("Gateway is not fully configured");
            }
            let mut table = output::create_table();
            table.add_row(vec!["Merchant ID", &settings.merchant_id]);
            table.add_row(vec!["Checkout base URL", &settings.checkout_base_url]);
            table.add_row(vec![
                "Webhook secret",
                if settings.webhook_secret.is_empty() { "(unset)" } else { "(set)" },
            ]);
            table.add_row(vec![
                "Checkout secret",
                if settings.checkout_secret.is_empty() { "(unset)" } else { "(set)" },
            ]);
            println!("{table}");
            Ok(())
        }
        GatewayCommands::Set {
            merchant_id,
            webhook_secret,
            checkout_secret,
            checkout_base_url,
            actor,
        } => {
            let payline_dir = get_payline_dir();
            let mut ctx = get_context()?;
            let caller = resolve_caller(&ctx, actor)?;

            let mut gateway = ctx.config.gateway.clone();
            if let Some(v) = merchant_id {
                gateway.merchant_id = v;
            }
            if let Some(v) = webhook_secret {
                gateway.webhook_secret = v;
            }
            if let Some(v) = checkout_secret {
                gateway.checkout_secret = v;
            }
            if let Some(v) = checkout_base_url {
                gateway.checkout_base_url = v;
            }

            // authorize before anything touches disk
            ctx.gateway.update_settings(&caller, gateway.clone())?;
            ctx.config.gateway = gateway;
            ctx.config.save(&payline_dir)?;

            output::success("Gateway settings updated");
            Ok(())
        }
    }
}
