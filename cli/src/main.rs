// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TokenVault Operator CLI
//!
//! Entry point for the `tokenvault` binary. Parses CLI arguments, initializes
//! logging, and runs one command against the vault persisted in
//! `--data-dir`.
//!
//! Subcommands:
//!
//! - `deploy`                 deploy a test token and a V1 vault proxy
//! - `upgrade v2|v3`          upgrade and run the new revision's initializer
//! - `deposit`, `withdraw`    move principal in and out
//! - `claim-yield`            pay out accrued yield (V2+)
//! - `request-withdrawal`, `execute-withdrawal`, `emergency-withdraw` (V3)
//! - `mint`, `approve`        drive the test token
//! - `set-fee`, `set-yield-rate`, `pause`, `unpause`, `set-delay`,
//!   `transfer-admin`         admin calls
//! - `status`, `events`       read-only inspection
//! - `version`                print build version information

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;

use tokenvault_contracts::{Address, VaultCall};

use cli::{Commands, TokenVaultCli};

fn main() -> Result<()> {
    let cli = TokenVaultCli::parse();
    logging::init_logging(cli.log_format, cli.verbose);

    let data_dir = cli.data_dir.as_path();
    let caller = cli.caller.as_deref();
    let json = cli.json;

    let call = match cli.command {
        Commands::Deploy(args) => {
            let outcome = commands::deploy(data_dir, caller, &args)?;
            return commands::emit(json, &outcome, commands::print_outcome);
        }
        Commands::Upgrade { target } => {
            let outcome = commands::upgrade(data_dir, &commands::require_caller(caller)?, &target)?;
            return commands::emit(json, &outcome, commands::print_outcome);
        }
        Commands::Mint(args) => {
            let report = commands::mint(data_dir, &Address::from(args.to), args.amount)?;
            return commands::emit(json, &report, commands::print_ledger);
        }
        Commands::Approve(args) => {
            let report = commands::approve(data_dir, &commands::require_caller(caller)?, args.amount)?;
            return commands::emit(json, &report, commands::print_ledger);
        }
        Commands::Status(args) => {
            let report = commands::status(data_dir, args.user.as_deref())?;
            return commands::emit(json, &report, commands::print_status);
        }
        Commands::Events => {
            let events = commands::events(data_dir)?;
            return commands::emit(json, &events, |events| commands::print_events(events));
        }
        Commands::Version => {
            print_version();
            return Ok(());
        }

        Commands::Deposit(args) => VaultCall::Deposit { amount: args.amount },
        Commands::Withdraw(args) => VaultCall::Withdraw { amount: args.amount },
        Commands::ClaimYield => VaultCall::ClaimYield,
        Commands::RequestWithdrawal(args) => VaultCall::RequestWithdrawal { amount: args.amount },
        Commands::ExecuteWithdrawal => VaultCall::ExecuteWithdrawal,
        Commands::EmergencyWithdraw => VaultCall::EmergencyWithdraw,
        Commands::SetFee(args) => VaultCall::SetDepositFee { bps: args.bps },
        Commands::SetYieldRate(args) => VaultCall::SetYieldRate { bps: args.bps },
        Commands::Pause => VaultCall::PauseDeposits,
        Commands::Unpause => VaultCall::UnpauseDeposits,
        Commands::SetDelay(args) => VaultCall::SetWithdrawalDelay { secs: args.secs },
        Commands::TransferAdmin(args) => VaultCall::TransferAdmin {
            new_admin: Address::from(args.new_admin),
        },
    };

    let caller = commands::require_caller(caller)?;
    let outcome = commands::send(data_dir, &caller, call)?;
    commands::emit(json, &outcome, commands::print_outcome)
}

/// Prints version information to stdout.
fn print_version() {
    println!("tokenvault {}", env!("CARGO_PKG_VERSION"));
    println!("  upgrade interface: {}", tokenvault_contracts::config::UPGRADE_INTERFACE_VERSION);
    println!("  latest revision:   {}", tokenvault_contracts::config::LATEST_REVISION);
}
