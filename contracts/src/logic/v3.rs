//! # TokenVaultV3: Delayed and Emergency Withdrawals
//!
//! Adds a per-user two-phase withdrawal on top of V2:
//!
//! ```text
//!            requestWithdrawal(a)              executeWithdrawal()
//!  [none] ──────────────────────▶ [requested] ─────────────────────▶ [none]
//!               ▲        │  requestWithdrawal(b): replaces a, restarts timer
//!               └────────┘
//!
//!  emergencyWithdraw(): pays the whole balance now and clears any request
//! ```
//!
//! The delay is a single global parameter read at execution time, so
//! changing it moves the ready time of requests already in flight. A
//! request is checked against the balance again at execution: a direct
//! `withdraw` in the meantime can make it unexecutable.

use crate::access::Role;
use crate::asset::AssetTransfer;
use crate::clock::saturating_add_secs;
use crate::error::VaultError;
use crate::storage::state::{VaultState, WithdrawalRequest};
use crate::types::{Amount, Revision};

use super::call::{CallOutput, VaultCall};
use super::events::VaultEvent;
use super::initializable::{check_tier, complete_tier};
use super::{v2, CallContext, Execution, VaultLogic};

/// The delayed-withdrawal revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVaultV3;

impl VaultLogic for TokenVaultV3 {
    fn revision(&self) -> Revision {
        Revision::V3
    }

    fn execute(&self, ctx: &CallContext<'_>, state: &mut VaultState, call: &VaultCall) -> Result<Execution, VaultError> {
        execute(ctx, state, call, Revision::V3)
    }
}

pub(crate) fn execute(
    ctx: &CallContext<'_>,
    state: &mut VaultState,
    call: &VaultCall,
    revision: Revision,
) -> Result<Execution, VaultError> {
    match call {
        VaultCall::InitializeV3 { withdrawal_delay_secs } => initialize_v3(ctx, state, *withdrawal_delay_secs),
        VaultCall::SetWithdrawalDelay { secs } => set_withdrawal_delay(ctx, state, *secs),
        VaultCall::GetWithdrawalDelay => Ok(Execution::view(CallOutput::Seconds(
            state.withdrawals.withdrawal_delay_secs,
        ))),
        VaultCall::RequestWithdrawal { amount } => request_withdrawal(ctx, state, *amount),
        VaultCall::GetWithdrawalRequest { user } => Ok(Execution::view(CallOutput::Request(
            state.withdrawals.withdrawal_requests.get(user).copied(),
        ))),
        VaultCall::ExecuteWithdrawal => execute_withdrawal(ctx, state),
        VaultCall::EmergencyWithdraw => emergency_withdraw(ctx, state),
        _ => v2::execute(ctx, state, call, revision),
    }
}

fn initialize_v3(ctx: &CallContext<'_>, state: &mut VaultState, delay_secs: u64) -> Result<Execution, VaultError> {
    check_tier(ctx, state.base.initialized, 3)?;
    state.base.roles.require_role(Role::DefaultAdmin, ctx.caller)?;

    state.withdrawals.withdrawal_delay_secs = delay_secs;
    complete_tier(&mut state.base.initialized, 3);

    tracing::info!(delay_secs, "delayed withdrawals activated");
    Ok(Execution::effect(VaultEvent::Initialized { tier: 3 }))
}

fn set_withdrawal_delay(ctx: &CallContext<'_>, state: &mut VaultState, secs: u64) -> Result<Execution, VaultError> {
    state.base.roles.require_role(Role::DefaultAdmin, ctx.caller)?;

    let old_secs = std::mem::replace(&mut state.withdrawals.withdrawal_delay_secs, secs);
    tracing::info!(old_secs, new_secs = secs, "withdrawal delay updated");
    Ok(Execution::effect(VaultEvent::WithdrawalDelayUpdated { old_secs, new_secs: secs }))
}

fn request_withdrawal(ctx: &CallContext<'_>, state: &mut VaultState, amount: Amount) -> Result<Execution, VaultError> {
    if amount == 0 {
        return Err(VaultError::invalid_amount(amount, "must be greater than zero"));
    }
    if amount > state.base.balance_of(ctx.caller) {
        return Err(VaultError::invalid_amount(amount, "exceeds balance"));
    }
    let ready_at = saturating_add_secs(ctx.now, state.withdrawals.withdrawal_delay_secs);

    let previous = state.withdrawals.withdrawal_requests.insert(
        ctx.caller.clone(),
        WithdrawalRequest {
            amount,
            requested_at: ctx.now,
        },
    );

    tracing::info!(
        user = %ctx.caller,
        amount,
        %ready_at,
        replaced = previous.is_some(),
        "withdrawal requested"
    );
    Ok(Execution::effect(VaultEvent::WithdrawalRequested {
        user: ctx.caller.clone(),
        amount,
        ready_at,
    }))
}

fn execute_withdrawal(ctx: &CallContext<'_>, state: &mut VaultState) -> Result<Execution, VaultError> {
    let request = state
        .withdrawals
        .withdrawal_requests
        .get(ctx.caller)
        .copied()
        .ok_or(VaultError::NoWithdrawalRequest)?;

    let ready_at = saturating_add_secs(request.requested_at, state.withdrawals.withdrawal_delay_secs);
    if ctx.now < ready_at {
        return Err(VaultError::DelayNotElapsed { ready_at });
    }

    let remaining = state.base.debit(ctx.caller, request.amount)?;
    state.withdrawals.withdrawal_requests.remove(ctx.caller);
    if remaining == 0 {
        state.accrual.deposit_timestamps.remove(ctx.caller);
    }

    tracing::info!(user = %ctx.caller, amount = request.amount, remaining, "withdrawal executed");
    Ok(Execution::effect(VaultEvent::WithdrawalExecuted {
        user: ctx.caller.clone(),
        amount: request.amount,
    })
    .with_transfer(AssetTransfer::Push {
        to: ctx.caller.clone(),
        amount: request.amount,
    }))
}

fn emergency_withdraw(ctx: &CallContext<'_>, state: &mut VaultState) -> Result<Execution, VaultError> {
    let amount = state.base.balance_of(ctx.caller);
    if amount == 0 {
        return Err(VaultError::ZeroBalance);
    }

    state.base.debit(ctx.caller, amount)?;
    let cleared = state.withdrawals.withdrawal_requests.remove(ctx.caller);
    state.accrual.deposit_timestamps.remove(ctx.caller);

    tracing::warn!(
        user = %ctx.caller,
        amount,
        cleared_request = cleared.is_some(),
        "emergency withdrawal"
    );
    Ok(Execution::effect(VaultEvent::EmergencyWithdrawn {
        user: ctx.caller.clone(),
        amount,
    })
    .with_transfer(AssetTransfer::Push {
        to: ctx.caller.clone(),
        amount,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_WITHDRAWAL_DELAY_SECS;
    use crate::types::Address;
    use chrono::{DateTime, Duration, Utc};

    fn funded_state(admin: &Address, user: &Address, balance: Amount) -> VaultState {
        let mut state = VaultState::default();
        state.base.initialized = 3;
        state.base.asset = Some(Address::from("token"));
        state.base.roles.grant_initial_admin(admin.clone()).unwrap();
        state.base.credit(user, balance).unwrap();
        state.withdrawals.withdrawal_delay_secs = DEFAULT_WITHDRAWAL_DELAY_SECS;
        state
    }

    fn run(state: &mut VaultState, caller: &Address, now: DateTime<Utc>, call: VaultCall) -> Result<Execution, VaultError> {
        let vault = Address::from("vault");
        let ctx = CallContext {
            caller,
            now,
            delegated: true,
            vault: &vault,
        };
        TokenVaultV3.execute(&ctx, state, &call)
    }

    #[test]
    fn request_then_execute_after_delay() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let t0 = Utc::now();
        let mut state = funded_state(&admin, &user, 95);

        run(&mut state, &user, t0, VaultCall::RequestWithdrawal { amount: 50 }).unwrap();
        let err = run(&mut state, &user, t0, VaultCall::ExecuteWithdrawal).unwrap_err();
        assert!(matches!(err, VaultError::DelayNotElapsed { .. }));
        assert_eq!(state.base.balance_of(&user), 95);

        let t1 = t0 + Duration::seconds(DEFAULT_WITHDRAWAL_DELAY_SECS as i64);
        let exec = run(&mut state, &user, t1, VaultCall::ExecuteWithdrawal).unwrap();
        assert_eq!(exec.transfer, Some(AssetTransfer::Push { to: user.clone(), amount: 50 }));
        assert_eq!(state.base.balance_of(&user), 45);
        assert!(state.withdrawals.withdrawal_requests.is_empty());
    }

    #[test]
    fn new_request_overwrites_previous() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let t0 = Utc::now();
        let mut state = funded_state(&admin, &user, 95);

        run(&mut state, &user, t0, VaultCall::RequestWithdrawal { amount: 40 }).unwrap();
        let t1 = t0 + Duration::hours(1);
        run(&mut state, &user, t1, VaultCall::RequestWithdrawal { amount: 20 }).unwrap();

        assert_eq!(state.withdrawals.withdrawal_requests.len(), 1);
        assert_eq!(
            state.withdrawals.withdrawal_requests.get(&user),
            Some(&WithdrawalRequest {
                amount: 20,
                requested_at: t1
            })
        );
    }

    #[test]
    fn request_bounds_checked() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let now = Utc::now();
        let mut state = funded_state(&admin, &user, 95);
        assert!(run(&mut state, &user, now, VaultCall::RequestWithdrawal { amount: 0 }).is_err());
        assert!(run(&mut state, &user, now, VaultCall::RequestWithdrawal { amount: 96 }).is_err());
        assert!(state.withdrawals.withdrawal_requests.is_empty());
    }

    #[test]
    fn execute_without_request_fails() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let mut state = funded_state(&admin, &user, 95);
        assert_eq!(
            run(&mut state, &user, Utc::now(), VaultCall::ExecuteWithdrawal).unwrap_err(),
            VaultError::NoWithdrawalRequest
        );
    }

    #[test]
    fn shrunken_balance_blocks_execution() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let t0 = Utc::now();
        let mut state = funded_state(&admin, &user, 95);
        run(&mut state, &user, t0, VaultCall::RequestWithdrawal { amount: 90 }).unwrap();
        run(&mut state, &user, t0, VaultCall::Withdraw { amount: 10 }).unwrap();

        let t1 = t0 + Duration::days(8);
        let err = run(&mut state, &user, t1, VaultCall::ExecuteWithdrawal).unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount { amount: 90, .. }));
    }

    #[test]
    fn delay_change_applies_to_pending_requests() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let t0 = Utc::now();
        let mut state = funded_state(&admin, &user, 95);
        run(&mut state, &user, t0, VaultCall::RequestWithdrawal { amount: 10 }).unwrap();
        run(&mut state, &admin, t0, VaultCall::SetWithdrawalDelay { secs: 0 }).unwrap();
        run(&mut state, &user, t0, VaultCall::ExecuteWithdrawal).unwrap();
        assert_eq!(state.base.balance_of(&user), 85);
    }

    #[test]
    fn unbounded_delay_accepts_requests_but_never_matures() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let t0 = Utc::now();
        let mut state = funded_state(&admin, &user, 95);
        run(&mut state, &admin, t0, VaultCall::SetWithdrawalDelay { secs: u64::MAX }).unwrap();

        let exec = run(&mut state, &user, t0, VaultCall::RequestWithdrawal { amount: 50 }).unwrap();
        assert_eq!(
            exec.events,
            vec![VaultEvent::WithdrawalRequested {
                user: user.clone(),
                amount: 50,
                ready_at: DateTime::<Utc>::MAX_UTC,
            }]
        );

        let t1 = t0 + Duration::days(365 * 100);
        let err = run(&mut state, &user, t1, VaultCall::ExecuteWithdrawal).unwrap_err();
        assert_eq!(err, VaultError::DelayNotElapsed { ready_at: DateTime::<Utc>::MAX_UTC });
        assert_eq!(state.base.balance_of(&user), 95);
        assert!(state.withdrawals.withdrawal_requests.contains_key(&user));

        // Emergency exit still works under a frozen delay.
        run(&mut state, &user, t1, VaultCall::EmergencyWithdraw).unwrap();
        assert_eq!(state.base.balance_of(&user), 0);
    }

    #[test]
    fn emergency_withdraw_pays_everything() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let now = Utc::now();
        let mut state = funded_state(&admin, &user, 95);
        run(&mut state, &user, now, VaultCall::RequestWithdrawal { amount: 50 }).unwrap();

        let exec = run(&mut state, &user, now, VaultCall::EmergencyWithdraw).unwrap();
        assert_eq!(exec.transfer, Some(AssetTransfer::Push { to: user.clone(), amount: 95 }));
        assert_eq!(state.base.total_deposits, 0);
        assert!(state.withdrawals.withdrawal_requests.is_empty());

        assert_eq!(
            run(&mut state, &user, now, VaultCall::EmergencyWithdraw).unwrap_err(),
            VaultError::ZeroBalance
        );
    }

    #[test]
    fn delay_setter_is_admin_only() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let mut state = funded_state(&admin, &user, 95);
        assert!(run(&mut state, &user, Utc::now(), VaultCall::SetWithdrawalDelay { secs: 0 }).is_err());
        assert_eq!(state.withdrawals.withdrawal_delay_secs, DEFAULT_WITHDRAWAL_DELAY_SECS);
    }

    #[test]
    fn v2_operations_still_dispatch() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let mut state = funded_state(&admin, &user, 95);
        let exec = run(&mut state, &user, Utc::now(), VaultCall::GetImplementationVersion).unwrap();
        assert_eq!(exec.output, CallOutput::Text("V3".into()));
        run(&mut state, &admin, Utc::now(), VaultCall::PauseDeposits).unwrap();
        assert!(state.accrual.deposits_paused);
    }
}
