//! # Command Handlers
//!
//! Every handler follows the same cycle: open the database, rebuild the
//! proxy and its token from the persisted deployment, run one operation,
//! and write the new state plus any emitted events back in a single batch.
//! A failed operation persists nothing.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use tokenvault_contracts::{
    builtin, Address, Amount, AssetLedger, CallOutput, CallReceipt, MockToken, Proxy, Revision, SystemClock,
    VaultCall, VaultClient, VaultDb, VaultEvent, WithdrawalRequest,
};

use crate::cli::{DeployArgs, UpgradeTarget};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of a vault call, printed by `main`.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub vault: Address,
    pub implementation: Revision,
    pub operation: String,
    pub output: CallOutput,
    pub events: Vec<VaultEvent>,
}

/// Result of a direct token operation (mint, approve).
#[derive(Debug, Serialize)]
pub struct LedgerReport {
    pub action: &'static str,
    pub account: Address,
    pub amount: Amount,
    pub balance: Amount,
    pub allowance: Amount,
}

/// Snapshot of a vault, read through the proxy.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub vault: Address,
    pub token: Address,
    pub implementation: Revision,
    pub initialized_tier: u8,
    pub admin: Option<Address>,
    pub total_deposits: Amount,
    pub deposit_fee_bps: u16,
    pub yield_rate_bps: Option<u16>,
    pub deposits_paused: Option<bool>,
    pub withdrawal_delay_secs: Option<u64>,
    pub vault_holdings: Amount,
    pub invariants: String,
    pub position: Option<Position>,
}

/// One user's view of the vault.
#[derive(Debug, Serialize)]
pub struct Position {
    pub user: Address,
    pub balance: Amount,
    pub wallet: Amount,
    pub pending_yield: Option<Amount>,
    pub withdrawal_request: Option<WithdrawalRequest>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A restored deployment plus the database it came from.
struct Session {
    db: VaultDb,
    proxy: Proxy,
    token: MockToken,
}

impl Session {
    fn open(data_dir: &Path) -> Result<Self> {
        let db = open_db(data_dir)?;
        let (record, token) = db
            .load_deployment()
            .with_context(|| format!("no vault deployed in {}; run `tokenvault deploy` first", data_dir.display()))?;
        let proxy = Proxy::restore(record, Arc::new(SystemClock)).context("failed to restore vault proxy")?;
        Ok(Self { db, proxy, token })
    }

    fn commit(&self, events: &[VaultEvent]) -> Result<()> {
        self.db
            .save(&self.proxy.record(), &self.token, events)
            .context("failed to persist vault state")
    }

    fn outcome(&self, receipt: CallReceipt) -> Outcome {
        Outcome {
            vault: self.proxy.address().clone(),
            implementation: self.proxy.implementation(),
            operation: receipt.operation.signature().to_string(),
            output: receipt.output,
            events: receipt.events,
        }
    }
}

fn open_db(data_dir: &Path) -> Result<VaultDb> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
    VaultDb::open(data_dir).with_context(|| format!("failed to open vault database at {}", data_dir.display()))
}

/// Resolves the principal issuing a call.
pub fn require_caller(caller: Option<&str>) -> Result<Address> {
    caller
        .filter(|c| !c.is_empty())
        .map(Address::from)
        .context("a caller is required: pass --caller or set TOKENVAULT_CALLER")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Deploys a fresh token and a V1 proxy initialized in the same step.
pub fn deploy(data_dir: &Path, caller: Option<&str>, args: &DeployArgs) -> Result<Outcome> {
    let db = open_db(data_dir)?;
    if db.is_deployed()? {
        bail!("a vault is already deployed in {}", data_dir.display());
    }

    let admin = Address::from(args.admin.as_str());
    let deployer = caller.map(Address::from).unwrap_or_else(|| admin.clone());
    let mut token = MockToken::new(args.token_name.as_str(), args.token_symbol.as_str(), 18);

    let (proxy, receipt) = Proxy::deploy(
        Address::generate("vault"),
        builtin(Revision::V1),
        Arc::new(SystemClock),
        &deployer,
        Some(VaultCall::Initialize {
            asset: token.address().clone(),
            admin,
            deposit_fee_bps: args.fee_bps,
        }),
    )
    .context("vault deployment failed")?;
    let receipt = receipt.context("deployment produced no initializer receipt")?;

    if let (Some(to), Some(amount)) = (&args.mint_to, args.mint_amount) {
        token.mint(&Address::from(to.as_str()), amount).context("seed mint failed")?;
    }

    let session = Session { db, proxy, token };
    session.commit(&receipt.events)?;
    tracing::info!(
        vault = %session.proxy.address(),
        token = %session.token.address(),
        "vault deployed"
    );
    Ok(session.outcome(receipt))
}

/// Sends one call through the proxy and persists the result.
pub fn send(data_dir: &Path, caller: &Address, call: VaultCall) -> Result<Outcome> {
    let mut session = Session::open(data_dir)?;
    let signature = call.operation().signature();
    let receipt = session
        .proxy
        .call(&mut session.token, caller, call)
        .with_context(|| format!("{signature} failed"))?;
    session.commit(&receipt.events)?;
    Ok(session.outcome(receipt))
}

/// Upgrades to the target revision and runs its initializer atomically.
pub fn upgrade(data_dir: &Path, caller: &Address, target: &UpgradeTarget) -> Result<Outcome> {
    let mut session = Session::open(data_dir)?;
    let (revision, init) = match *target {
        UpgradeTarget::V2 { yield_rate_bps } => (Revision::V2, VaultCall::InitializeV2 { yield_rate_bps }),
        UpgradeTarget::V3 { delay_secs } => (
            Revision::V3,
            VaultCall::InitializeV3 {
                withdrawal_delay_secs: delay_secs,
            },
        ),
    };

    let from = session.proxy.implementation();
    let receipt = session
        .proxy
        .upgrade_to_and_call(caller, builtin(revision), Some(init))
        .with_context(|| format!("upgrade {from} -> {revision} rejected"))?;
    session.commit(&receipt.events)?;
    Ok(session.outcome(receipt))
}

/// Mints test tokens. The mock token has no minting authority.
pub fn mint(data_dir: &Path, to: &Address, amount: Amount) -> Result<LedgerReport> {
    let mut session = Session::open(data_dir)?;
    session.token.mint(to, amount).context("mint failed")?;
    session.commit(&[])?;
    Ok(ledger_report(&session, "mint", to, amount))
}

/// Sets the vault's allowance over `owner`'s tokens.
pub fn approve(data_dir: &Path, owner: &Address, amount: Amount) -> Result<LedgerReport> {
    let mut session = Session::open(data_dir)?;
    let spender = session.proxy.address().clone();
    session.token.approve(owner, &spender, amount);
    session.commit(&[])?;
    Ok(ledger_report(&session, "approve", owner, amount))
}

fn ledger_report(session: &Session, action: &'static str, account: &Address, amount: Amount) -> LedgerReport {
    LedgerReport {
        action,
        account: account.clone(),
        amount,
        balance: session.token.balance_of(account),
        allowance: session.token.allowance(account, session.proxy.address()),
    }
}

/// Reads configuration, totals, and optionally one user's position. Writes
/// nothing.
pub fn status(data_dir: &Path, user: Option<&str>) -> Result<StatusReport> {
    let mut session = Session::open(data_dir)?;
    let implementation = session.proxy.implementation();
    let initialized_tier = session.proxy.state().base.initialized;
    let invariants = match session.proxy.audit() {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };

    let vault = VaultClient::new(&mut session.proxy, &mut session.token);
    let yields = implementation >= Revision::V2;
    let delays = implementation >= Revision::V3;

    let position = match user {
        Some(user) => {
            let user = Address::from(user);
            Some(Position {
                balance: vault.balance_of(&user)?,
                wallet: vault.ledger().balance_of(&user),
                pending_yield: if yields { Some(vault.user_yield(&user)?) } else { None },
                withdrawal_request: if delays { vault.withdrawal_request(&user)? } else { None },
                user,
            })
        }
        None => None,
    };

    Ok(StatusReport {
        generated_at: Utc::now(),
        vault: vault.proxy().address().clone(),
        token: vault.asset()?.context("vault has no asset configured")?,
        implementation,
        initialized_tier,
        admin: vault.admin()?,
        total_deposits: vault.total_deposits()?,
        deposit_fee_bps: vault.deposit_fee()?,
        yield_rate_bps: if yields { Some(vault.yield_rate()?) } else { None },
        deposits_paused: if yields { Some(vault.is_deposits_paused()?) } else { None },
        withdrawal_delay_secs: if delays { Some(vault.withdrawal_delay()?) } else { None },
        vault_holdings: vault.ledger().balance_of(vault.proxy().address()),
        invariants,
        position,
    })
}

/// Every persisted event, oldest first.
pub fn events(data_dir: &Path) -> Result<Vec<VaultEvent>> {
    let db = open_db(data_dir)?;
    db.events().context("failed to read event log")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Prints `value` as pretty JSON or through `human`.
pub fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).context("failed to encode output")?);
    } else {
        human(value);
    }
    Ok(())
}

pub fn print_outcome(outcome: &Outcome) {
    println!("{} via {} ({})", outcome.operation, outcome.vault, outcome.implementation);
    if outcome.output != CallOutput::None {
        println!("  output: {:?}", outcome.output);
    }
    for event in &outcome.events {
        println!("  event {}: {:?}", event.name(), event);
    }
}

pub fn print_ledger(report: &LedgerReport) {
    println!(
        "{} {} for {}: balance {}, vault allowance {}",
        report.action, report.amount, report.account, report.balance, report.allowance
    );
}

pub fn print_status(report: &StatusReport) {
    println!("vault           {}", report.vault);
    println!("token           {}", report.token);
    println!("implementation  {} (initialized tier {})", report.implementation, report.initialized_tier);
    match &report.admin {
        Some(admin) => println!("admin           {admin}"),
        None => println!("admin           <none>"),
    }
    println!("total deposits  {}", report.total_deposits);
    println!("vault holdings  {}", report.vault_holdings);
    println!("deposit fee     {} bps", report.deposit_fee_bps);
    if let Some(bps) = report.yield_rate_bps {
        println!("yield rate      {bps} bps");
    }
    if let Some(paused) = report.deposits_paused {
        println!("deposits paused {paused}");
    }
    if let Some(secs) = report.withdrawal_delay_secs {
        println!("withdraw delay  {secs}s");
    }
    println!("invariants      {}", report.invariants);

    if let Some(position) = &report.position {
        println!();
        println!("user            {}", position.user);
        println!("  balance       {}", position.balance);
        println!("  wallet        {}", position.wallet);
        if let Some(pending) = position.pending_yield {
            println!("  pending yield {pending}");
        }
        if let Some(request) = &position.withdrawal_request {
            println!("  request       {} at {}", request.amount, request.requested_at.to_rfc3339());
        }
    }
}

pub fn print_events(events: &[VaultEvent]) {
    if events.is_empty() {
        println!("no events");
    }
    for (seq, event) in events.iter().enumerate() {
        println!("{seq:>6}  {:<22} {:?}", event.name(), event);
    }
}
