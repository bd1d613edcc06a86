//! # TokenVaultV2: Yield and Pausable Deposits
//!
//! Adds simple, non-compounding yield on principal and an admin switch that
//! stops new deposits. Withdrawals and claims stay open while paused.
//!
//! ## Accrual
//!
//! ```text
//! yield = balance * yield_rate_bps / 10_000 * elapsed / SECONDS_PER_YEAR
//! ```
//!
//! `elapsed` runs from the user's accrual start: their last V2+ deposit or
//! claim, or for balances carried over from V1, the moment tier 2 was
//! initialized. A new deposit restarts the clock for the whole balance.
//!
//! Yield is paid from whatever the vault holds. There is no reserve check;
//! if the ledger cannot cover a claim the call fails and rolls back.

use chrono::{DateTime, Utc};

use crate::access::Role;
use crate::asset::AssetTransfer;
use crate::clock::elapsed_secs;
use crate::config::is_valid_basis_points;
use crate::error::VaultError;
use crate::storage::state::VaultState;
use crate::types::{Address, Amount, Revision};

use super::call::{CallOutput, VaultCall};
use super::events::VaultEvent;
use super::initializable::{check_tier, complete_tier};
use super::math::accrued_yield;
use super::{v1, CallContext, Execution, VaultLogic};

/// The yield-bearing revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVaultV2;

impl VaultLogic for TokenVaultV2 {
    fn revision(&self) -> Revision {
        Revision::V2
    }

    fn execute(&self, ctx: &CallContext<'_>, state: &mut VaultState, call: &VaultCall) -> Result<Execution, VaultError> {
        execute(ctx, state, call, Revision::V2)
    }
}

pub(crate) fn execute(
    ctx: &CallContext<'_>,
    state: &mut VaultState,
    call: &VaultCall,
    revision: Revision,
) -> Result<Execution, VaultError> {
    match call {
        VaultCall::InitializeV2 { yield_rate_bps } => initialize_v2(ctx, state, *yield_rate_bps),
        VaultCall::Deposit { amount } => {
            if state.accrual.deposits_paused {
                return Err(VaultError::DepositsPaused);
            }
            let execution = v1::deposit(ctx, &mut state.base, *amount)?;
            state
                .accrual
                .deposit_timestamps
                .insert(ctx.caller.clone(), ctx.now);
            Ok(execution)
        }
        VaultCall::Withdraw { amount } => {
            let execution = v1::withdraw(ctx, &mut state.base, *amount)?;
            if state.base.balance_of(ctx.caller) == 0 {
                state.accrual.deposit_timestamps.remove(ctx.caller);
            }
            Ok(execution)
        }
        VaultCall::SetYieldRate { bps } => set_yield_rate(ctx, state, *bps),
        VaultCall::GetYieldRate => Ok(Execution::view(CallOutput::BasisPoints(state.accrual.yield_rate_bps))),
        VaultCall::GetUserYield { user } => Ok(Execution::view(CallOutput::Amount(pending_yield(
            state, user, ctx.now,
        )?))),
        VaultCall::ClaimYield => claim_yield(ctx, state),
        VaultCall::PauseDeposits => set_paused(ctx, state, true),
        VaultCall::UnpauseDeposits => set_paused(ctx, state, false),
        VaultCall::IsDepositsPaused => Ok(Execution::view(CallOutput::Bool(state.accrual.deposits_paused))),
        _ => v1::execute(ctx, &mut state.base, call, revision),
    }
}

/// Yield `user` could claim at `now`.
pub fn pending_yield(state: &VaultState, user: &Address, now: DateTime<Utc>) -> Result<Amount, VaultError> {
    let balance = state.base.balance_of(user);
    if balance == 0 {
        return Ok(0);
    }
    match state.accrual.accrual_start(user) {
        Some(start) => accrued_yield(balance, state.accrual.yield_rate_bps, elapsed_secs(start, now)),
        None => Ok(0),
    }
}

fn initialize_v2(ctx: &CallContext<'_>, state: &mut VaultState, yield_rate_bps: u16) -> Result<Execution, VaultError> {
    check_tier(ctx, state.base.initialized, 2)?;
    state.base.roles.require_role(Role::DefaultAdmin, ctx.caller)?;
    if !is_valid_basis_points(yield_rate_bps) {
        return Err(VaultError::InvalidBasisPoints(yield_rate_bps));
    }

    state.accrual.yield_rate_bps = yield_rate_bps;
    state.accrual.deposits_paused = false;
    state.accrual.yield_activated_at = Some(ctx.now);
    complete_tier(&mut state.base.initialized, 2);

    tracing::info!(yield_rate_bps, "yield accrual activated");
    Ok(Execution::effect(VaultEvent::Initialized { tier: 2 }))
}

fn set_yield_rate(ctx: &CallContext<'_>, state: &mut VaultState, bps: u16) -> Result<Execution, VaultError> {
    state.base.roles.require_role(Role::DefaultAdmin, ctx.caller)?;
    if !is_valid_basis_points(bps) {
        return Err(VaultError::InvalidBasisPoints(bps));
    }

    let old_bps = std::mem::replace(&mut state.accrual.yield_rate_bps, bps);
    tracing::info!(old_bps, new_bps = bps, "yield rate updated");
    Ok(Execution::effect(VaultEvent::YieldRateUpdated { old_bps, new_bps: bps }))
}

fn claim_yield(ctx: &CallContext<'_>, state: &mut VaultState) -> Result<Execution, VaultError> {
    let amount = pending_yield(state, ctx.caller, ctx.now)?;
    if amount == 0 {
        return Err(VaultError::NoYieldAvailable);
    }

    state
        .accrual
        .deposit_timestamps
        .insert(ctx.caller.clone(), ctx.now);

    tracing::info!(user = %ctx.caller, amount, "yield claimed");
    Ok(Execution::effect(VaultEvent::YieldClaimed {
        user: ctx.caller.clone(),
        amount,
    })
    .with_transfer(AssetTransfer::Push {
        to: ctx.caller.clone(),
        amount,
    }))
}

fn set_paused(ctx: &CallContext<'_>, state: &mut VaultState, paused: bool) -> Result<Execution, VaultError> {
    state.base.roles.require_role(Role::DefaultAdmin, ctx.caller)?;
    state.accrual.deposits_paused = paused;

    let by = ctx.caller.clone();
    let event = if paused {
        tracing::info!(by = %by, "deposits paused");
        VaultEvent::DepositsPaused { by }
    } else {
        tracing::info!(by = %by, "deposits unpaused");
        VaultEvent::DepositsUnpaused { by }
    };
    Ok(Execution::effect(event))
}
