//! # CLI Interface
//!
//! Command-line structure for the `tokenvault` operator binary, defined with
//! `clap` derive. Every invocation opens the vault database in
//! `--data-dir`, runs one command, and persists the result.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use tokenvault_contracts::config::{
    DEFAULT_DEPOSIT_FEE_BPS, DEFAULT_WITHDRAWAL_DELAY_SECS, DEFAULT_YIELD_RATE_BPS,
};

use crate::logging::LogFormat;

/// TokenVault operator tooling.
///
/// Deploys an upgradeable custody vault with an in-memory test token,
/// upgrades it through its logic revisions, and issues user and admin
/// calls against it.
#[derive(Parser, Debug)]
#[command(
    name = "tokenvault",
    about = "Deploy, upgrade, and operate a TokenVault",
    version,
    propagate_version = true
)]
pub struct TokenVaultCli {
    /// Directory holding the vault database.
    #[arg(long, short = 'd', global = true, env = "TOKENVAULT_DATA_DIR", default_value = "./tokenvault-data")]
    pub data_dir: PathBuf,

    /// Principal issuing the call.
    #[arg(long, short = 'c', global = true, env = "TOKENVAULT_CALLER")]
    pub caller: Option<String>,

    /// Log format for stderr.
    #[arg(long, global = true, env = "TOKENVAULT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Raise vault logging to debug (-v) or trace (-vv). Ignored when
    /// RUST_LOG is set.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a token and a V1 vault proxy in front of it.
    Deploy(DeployArgs),
    /// Upgrade the vault to a newer logic revision.
    Upgrade {
        #[command(subcommand)]
        target: UpgradeTarget,
    },
    /// Deposit into the vault (net of the deposit fee).
    Deposit(AmountArgs),
    /// Withdraw principal immediately.
    Withdraw(AmountArgs),
    /// Claim accrued yield (V2+).
    ClaimYield,
    /// Open or replace a delayed withdrawal request (V3).
    RequestWithdrawal(AmountArgs),
    /// Execute a matured withdrawal request (V3).
    ExecuteWithdrawal,
    /// Withdraw the whole balance, bypassing the delay (V3).
    EmergencyWithdraw,
    /// Mint test tokens to an account.
    Mint(MintArgs),
    /// Approve the vault to pull tokens from the caller.
    Approve(AmountArgs),
    /// Set the deposit fee in basis points (admin).
    SetFee(BpsArgs),
    /// Set the annual yield rate in basis points (admin, V2+).
    SetYieldRate(BpsArgs),
    /// Pause deposits (admin, V2+).
    Pause,
    /// Unpause deposits (admin, V2+).
    Unpause,
    /// Set the withdrawal delay in seconds (admin, V3).
    SetDelay(DelayArgs),
    /// Hand the admin role to another principal (admin).
    TransferAdmin(TransferAdminArgs),
    /// Show the vault's configuration, totals, and optionally one user's
    /// position.
    Status(StatusArgs),
    /// List every event the vault has emitted.
    Events,
    /// Print version information and exit.
    Version,
}

/// Upgrade targets, each bundled with its initializer.
#[derive(Subcommand, Debug)]
pub enum UpgradeTarget {
    /// Upgrade to V2 and activate yield.
    V2 {
        /// Annual yield rate in basis points.
        #[arg(long, default_value_t = DEFAULT_YIELD_RATE_BPS)]
        yield_rate_bps: u16,
    },
    /// Upgrade to V3 and activate delayed withdrawals.
    V3 {
        /// Withdrawal delay in seconds.
        #[arg(long, default_value_t = DEFAULT_WITHDRAWAL_DELAY_SECS)]
        delay_secs: u64,
    },
}

/// Arguments for the `deploy` subcommand.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Principal that receives the admin role.
    #[arg(long)]
    pub admin: String,

    /// Deposit fee in basis points.
    #[arg(long, default_value_t = DEFAULT_DEPOSIT_FEE_BPS)]
    pub fee_bps: u16,

    /// Test token name.
    #[arg(long, default_value = "Mock Token")]
    pub token_name: String,

    /// Test token symbol.
    #[arg(long, default_value = "MOCK")]
    pub token_symbol: String,

    /// Seed this account with test tokens after deployment.
    #[arg(long, requires = "mint_amount")]
    pub mint_to: Option<String>,

    /// Amount to seed `--mint-to` with.
    #[arg(long, requires = "mint_to")]
    pub mint_amount: Option<u128>,
}

#[derive(Args, Debug)]
pub struct AmountArgs {
    /// Amount in the token's smallest unit.
    pub amount: u128,
}

#[derive(Args, Debug)]
pub struct BpsArgs {
    /// Basis points, 0..=10000.
    pub bps: u16,
}

#[derive(Args, Debug)]
pub struct DelayArgs {
    /// Delay in seconds.
    pub secs: u64,
}

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Recipient.
    #[arg(long)]
    pub to: String,
    /// Amount in the token's smallest unit.
    pub amount: u128,
}

#[derive(Args, Debug)]
pub struct TransferAdminArgs {
    /// New admin principal.
    pub new_admin: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also report this user's position.
    #[arg(long)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        TokenVaultCli::command().debug_assert();
    }

    #[test]
    fn upgrade_defaults() {
        let cli = TokenVaultCli::parse_from(["tokenvault", "--caller", "admin", "upgrade", "v3"]);
        match cli.command {
            Commands::Upgrade {
                target: UpgradeTarget::V3 { delay_secs },
            } => assert_eq!(delay_secs, DEFAULT_WITHDRAWAL_DELAY_SECS),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.caller.as_deref(), Some("admin"));
    }

    #[test]
    fn logging_flags() {
        let cli = TokenVaultCli::parse_from(["tokenvault", "-vv", "--log-format", "json", "events"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(TokenVaultCli::try_parse_from(["tokenvault", "--log-format", "xml", "events"]).is_err());
    }

    #[test]
    fn deploy_mint_flags_go_together() {
        let result = TokenVaultCli::try_parse_from(["tokenvault", "deploy", "--admin", "a", "--mint-to", "u"]);
        assert!(result.is_err());
    }
}
