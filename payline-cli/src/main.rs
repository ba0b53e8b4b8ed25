//! Payline CLI - peer-to-peer balance ledger in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{account, cancel, deposit, gateway, history, logs, status, transfer};

/// Payline - balance ledger in your terminal
#[derive(Parser)]
#[command(name = "pl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Send funds to another account
    Send {
        /// Destination account
        to: String,
        /// Amount to send
        amount: String,
        /// Source account (defaults to the acting account)
        #[arg(long)]
        from: Option<String>,
        /// Description recorded on the transfer
        #[arg(long, short)]
        description: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },

    /// Grant funds to an account without debiting anyone (admin)
    Grant {
        /// Destination account
        to: String,
        /// Amount to grant
        amount: String,
        /// Description recorded on the transfer
        #[arg(long, short)]
        description: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },

    /// Cancel a completed transfer and refund it (admin)
    Cancel {
        /// Transfer to cancel
        transfer_id: String,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },

    /// Show transfer history
    History {
        /// Account to inspect (defaults to the acting account)
        account_id: Option<String>,
        /// Show every transfer in the ledger (admin)
        #[arg(long)]
        all: bool,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage deposit claims
    Deposit {
        #[command(subcommand)]
        command: deposit::DepositCommands,
    },

    /// File a gateway deposit claim and print its checkout URL
    Pay {
        /// Amount to pay in
        amount: String,
        /// Account to credit (defaults to the acting account)
        #[arg(long)]
        account: Option<String>,
        /// Act as this account
        #[arg(long = "as")]
        actor: Option<String>,
    },

    /// Process an inbound gateway settlement webhook
    Webhook {
        /// Merchant id reported by the gateway (m)
        #[arg(long)]
        merchant: String,
        /// Amount reported by the gateway (amount)
        #[arg(long)]
        amount: String,
        /// Claim id (merchant order id)
        #[arg(long)]
        claim: String,
        /// MD5 signature (sign)
        #[arg(long)]
        signature: String,
    },

    /// Manage gateway credentials
    Gateway {
        #[command(subcommand)]
        command: gateway::GatewayCommands,
    },

    /// Show ledger summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Account { command } => account::run(command),
        Commands::Send {
            to,
            amount,
            from,
            description,
            actor,
        } => transfer::send(&to, &amount, from, description, actor),
        Commands::Grant {
            to,
            amount,
            description,
            actor,
        } => transfer::grant(&to, &amount, description, actor),
        Commands::Cancel { transfer_id, actor } => cancel::run(&transfer_id, actor),
        Commands::History {
            account_id,
            all,
            actor,
            json,
        } => history::run(account_id, all, actor, json),
        Commands::Deposit { command } => deposit::run(command),
        Commands::Pay {
            amount,
            account,
            actor,
        } => gateway::pay(&amount, account, actor),
        Commands::Webhook {
            merchant,
            amount,
            claim,
            signature,
        } => gateway::webhook(&merchant, &amount, &claim, &signature),
        Commands::Gateway { command } => gateway::run(command),
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
