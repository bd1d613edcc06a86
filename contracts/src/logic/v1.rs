//! # TokenVaultV1: Base Accounting
//!
//! Deposits net of a basis-point fee, withdrawals of principal, and the
//! admin role. V1 reads and writes only the base storage group.
//!
//! ## Deposit
//!
//! ```text
//! gross ──pull──▶ vault custody
//!   fee = gross * deposit_fee_bps / 10_000   (retained, not tracked)
//!   net = gross - fee                        (credited to balance and total)
//! ```
//!
//! The fee is the implicit difference between what the ledger holds and
//! `total_deposits`.

use crate::access::Role;
use crate::asset::AssetTransfer;
use crate::config::{is_valid_basis_points, IMPLEMENTATION_SLOT, UPGRADE_INTERFACE_VERSION};
use crate::error::VaultError;
use crate::storage::state::{BaseSlots, VaultState};
use crate::types::{Address, Amount, Revision};

use super::call::{CallOutput, VaultCall};
use super::events::VaultEvent;
use super::initializable::{check_tier, complete_tier};
use super::math::deposit_fee;
use super::{unsupported, CallContext, Execution, VaultLogic};

/// The base revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVaultV1;

impl VaultLogic for TokenVaultV1 {
    fn revision(&self) -> Revision {
        Revision::V1
    }

    fn execute(&self, ctx: &CallContext<'_>, state: &mut VaultState, call: &VaultCall) -> Result<Execution, VaultError> {
        execute(ctx, &mut state.base, call, Revision::V1)
    }
}

/// Dispatches the V1 surface against the base group. `revision` is the
/// revision actually serving the call, reported by
/// `getImplementationVersion()`.
pub(crate) fn execute(
    ctx: &CallContext<'_>,
    base: &mut BaseSlots,
    call: &VaultCall,
    revision: Revision,
) -> Result<Execution, VaultError> {
    match call {
        VaultCall::Initialize {
            asset,
            admin,
            deposit_fee_bps,
        } => initialize(ctx, base, asset, admin, *deposit_fee_bps),
        VaultCall::Deposit { amount } => deposit(ctx, base, *amount),
        VaultCall::Withdraw { amount } => withdraw(ctx, base, *amount),
        VaultCall::BalanceOf { user } => Ok(Execution::view(CallOutput::Amount(base.balance_of(user)))),
        VaultCall::TotalDeposits => Ok(Execution::view(CallOutput::Amount(base.total_deposits))),
        VaultCall::GetDepositFee => Ok(Execution::view(CallOutput::BasisPoints(base.deposit_fee_bps))),
        VaultCall::SetDepositFee { bps } => set_deposit_fee(ctx, base, *bps),
        VaultCall::GetAsset => Ok(Execution::view(CallOutput::Address(base.asset.clone()))),
        VaultCall::GetAdmin => Ok(Execution::view(CallOutput::Address(base.roles.admin().cloned()))),
        VaultCall::HasRole { role, account } => {
            let held = Role::from_id(role)
                .map(|role| base.roles.has_role(role, account))
                .unwrap_or(false);
            Ok(Execution::view(CallOutput::Bool(held)))
        }
        VaultCall::TransferAdmin { new_admin } => {
            let previous = base.roles.transfer_admin(ctx.caller, new_admin.clone())?;
            tracing::info!(previous = %previous, new_admin = %new_admin, "admin role transferred");
            Ok(Execution::effect(VaultEvent::AdminTransferred {
                previous,
                new_admin: new_admin.clone(),
            }))
        }
        VaultCall::GetImplementationVersion => Ok(Execution::view(CallOutput::Text(revision.tag().to_string()))),
        VaultCall::UpgradeInterfaceVersion => Ok(Execution::view(CallOutput::Text(
            UPGRADE_INTERFACE_VERSION.to_string(),
        ))),
        VaultCall::ProxiableUuid => Ok(Execution::view(CallOutput::Bytes32(IMPLEMENTATION_SLOT))),
        _ => Err(unsupported(call, revision)),
    }
}

fn initialize(
    ctx: &CallContext<'_>,
    base: &mut BaseSlots,
    asset: &Address,
    admin: &Address,
    deposit_fee_bps: u16,
) -> Result<Execution, VaultError> {
    check_tier(ctx, base.initialized, 1)?;
    if !is_valid_basis_points(deposit_fee_bps) {
        return Err(VaultError::InvalidBasisPoints(deposit_fee_bps));
    }

    base.roles.grant_initial_admin(admin.clone())?;
    base.asset = Some(asset.clone());
    base.deposit_fee_bps = deposit_fee_bps;
    complete_tier(&mut base.initialized, 1);

    tracing::info!(asset = %asset, admin = %admin, fee_bps = deposit_fee_bps, "vault initialized");
    Ok(Execution::effect(VaultEvent::Initialized { tier: 1 }))
}

/// Credits `amount` less the deposit fee and requests the pull.
pub(crate) fn deposit(ctx: &CallContext<'_>, base: &mut BaseSlots, amount: Amount) -> Result<Execution, VaultError> {
    if amount == 0 {
        return Err(VaultError::invalid_amount(amount, "must be greater than zero"));
    }

    let fee = deposit_fee(amount, base.deposit_fee_bps)?;
    let net = amount.checked_sub(fee).ok_or(VaultError::ArithmeticOverflow)?;
    let balance = base.credit(ctx.caller, net)?;

    tracing::info!(user = %ctx.caller, gross = amount, fee, net, balance, "deposit");
    Ok(Execution::effect(VaultEvent::Deposited {
        user: ctx.caller.clone(),
        gross: amount,
        fee,
        net,
    })
    .with_transfer(AssetTransfer::Pull {
        from: ctx.caller.clone(),
        amount,
    }))
}

/// Debits `amount` and requests the push.
pub(crate) fn withdraw(ctx: &CallContext<'_>, base: &mut BaseSlots, amount: Amount) -> Result<Execution, VaultError> {
    if amount == 0 {
        return Err(VaultError::invalid_amount(amount, "must be greater than zero"));
    }

    let remaining = base.debit(ctx.caller, amount)?;

    tracing::info!(user = %ctx.caller, amount, remaining, "withdraw");
    Ok(Execution::effect(VaultEvent::Withdrawn {
        user: ctx.caller.clone(),
        amount,
    })
    .with_transfer(AssetTransfer::Push {
        to: ctx.caller.clone(),
        amount,
    }))
}

fn set_deposit_fee(ctx: &CallContext<'_>, base: &mut BaseSlots, bps: u16) -> Result<Execution, VaultError> {
    base.roles.require_role(Role::DefaultAdmin, ctx.caller)?;
    if !is_valid_basis_points(bps) {
        return Err(VaultError::InvalidBasisPoints(bps));
    }

    let old_bps = std::mem::replace(&mut base.deposit_fee_bps, bps);
    tracing::info!(old_bps, new_bps = bps, "deposit fee updated");
    Ok(Execution::effect(VaultEvent::DepositFeeUpdated { old_bps, new_bps: bps }))
}
