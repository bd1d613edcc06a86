//! Integration tests for the full V1 → V2 → V3 upgrade path and the
//! delayed-withdrawal state machine.

use std::sync::Arc;

use tokenvault_contracts::config::DEFAULT_WITHDRAWAL_DELAY_SECS;
use tokenvault_contracts::{
    builtin, Address, Amount, AssetLedger, ManualClock, MockToken, Proxy, Revision, VaultCall, VaultClient,
    VaultError, VaultEvent, WithdrawalRequest,
};

const ONE: Amount = 1_000_000_000_000_000_000;

struct Fixture {
    proxy: Proxy,
    token: MockToken,
    clock: ManualClock,
    admin: Address,
    user: Address,
}

/// Helper: deploys V1, deposits 100 for `user`, then upgrades through V2 to
/// V3 with a 7-day delay.
fn deploy_v3() -> Fixture {
    let admin = Address::from("admin");
    let user = Address::from("user");
    let clock = ManualClock::starting_now();
    let mut token = MockToken::new("Mock Token", "MOCK", 18);

    let (mut proxy, _) = Proxy::deploy(
        Address::generate("vault"),
        builtin(Revision::V1),
        Arc::new(clock.clone()),
        &admin,
        Some(VaultCall::Initialize {
            asset: token.address().clone(),
            admin: admin.clone(),
            deposit_fee_bps: 500,
        }),
    )
    .unwrap();

    token.mint(&user, 1_000 * ONE).unwrap();
    token.approve(&user, proxy.address(), Amount::MAX);
    proxy
        .call(&mut token, &user, VaultCall::Deposit { amount: 100 * ONE })
        .unwrap();

    proxy
        .upgrade_to_and_call(
            &admin,
            builtin(Revision::V2),
            Some(VaultCall::InitializeV2 { yield_rate_bps: 500 }),
        )
        .unwrap();
    proxy
        .upgrade_to_and_call(
            &admin,
            builtin(Revision::V3),
            Some(VaultCall::InitializeV3 {
                withdrawal_delay_secs: DEFAULT_WITHDRAWAL_DELAY_SECS,
            }),
        )
        .unwrap();

    Fixture {
        proxy,
        token,
        clock,
        admin,
        user,
    }
}

// ---------------------------------------------------------------------------
// Upgrade path
// ---------------------------------------------------------------------------

#[test]
fn state_survives_two_upgrades() {
    let mut f = deploy_v3();
    let vault = VaultClient::new(&mut f.proxy, &mut f.token);

    assert_eq!(vault.implementation_version().unwrap(), "V3");
    assert_eq!(vault.balance_of(&f.user).unwrap(), 95 * ONE);
    assert_eq!(vault.total_deposits().unwrap(), 95 * ONE);
    assert_eq!(vault.yield_rate().unwrap(), 500);
    assert_eq!(vault.withdrawal_delay().unwrap(), DEFAULT_WITHDRAWAL_DELAY_SECS);
    assert!(vault.is_admin(&f.admin).unwrap());
    assert_eq!(vault.proxy().state().base.initialized, 3);
}

#[test]
fn v3_initializer_cannot_rerun() {
    let mut f = deploy_v3();
    let err = f
        .proxy
        .call(&mut f.token, &f.admin, VaultCall::InitializeV3 { withdrawal_delay_secs: 0 })
        .unwrap_err();
    assert_eq!(err, VaultError::AlreadyInitialized { tier: 3 });
    assert_eq!(f.proxy.state().withdrawals.withdrawal_delay_secs, DEFAULT_WITHDRAWAL_DELAY_SECS);
}

// ---------------------------------------------------------------------------
// Delayed withdrawals
// ---------------------------------------------------------------------------

#[test]
fn immediate_execution_fails_then_succeeds_after_delay() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    vault.request_withdrawal(&f.user, 50 * ONE).unwrap();
    let err = vault.execute_withdrawal(&f.user).unwrap_err();
    assert!(matches!(err, VaultError::DelayNotElapsed { .. }));
    assert_eq!(vault.balance_of(&f.user).unwrap(), 95 * ONE);

    f.clock.advance_secs(DEFAULT_WITHDRAWAL_DELAY_SECS as i64 + 1);
    let receipt = vault.execute_withdrawal(&f.user).unwrap();
    assert_eq!(
        receipt.events,
        vec![VaultEvent::WithdrawalExecuted {
            user: f.user.clone(),
            amount: 50 * ONE
        }]
    );
    assert_eq!(vault.balance_of(&f.user).unwrap(), 45 * ONE);
    assert_eq!(vault.ledger().balance_of(&f.user), 950 * ONE);
    assert_eq!(vault.withdrawal_request(&f.user).unwrap(), None);
}

#[test]
fn second_execution_sees_cleared_request() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    vault.request_withdrawal(&f.user, 10 * ONE).unwrap();
    f.clock.advance_secs(DEFAULT_WITHDRAWAL_DELAY_SECS as i64);
    vault.execute_withdrawal(&f.user).unwrap();

    assert_eq!(
        vault.execute_withdrawal(&f.user).unwrap_err(),
        VaultError::NoWithdrawalRequest
    );
    assert_eq!(vault.balance_of(&f.user).unwrap(), 85 * ONE);
}

#[test]
fn latest_request_wins() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    vault.request_withdrawal(&f.user, 40 * ONE).unwrap();
    f.clock.advance_secs(3_600);
    vault.request_withdrawal(&f.user, 20 * ONE).unwrap();

    let request: WithdrawalRequest = vault.withdrawal_request(&f.user).unwrap().unwrap();
    assert_eq!(request.amount, 20 * ONE);
    assert_eq!(vault.proxy().state().withdrawals.withdrawal_requests.len(), 1);

    // The timer restarted with the second request.
    f.clock.advance_secs(DEFAULT_WITHDRAWAL_DELAY_SECS as i64 - 1_800);
    assert!(vault.execute_withdrawal(&f.user).is_err());
    f.clock.advance_secs(1_800);
    vault.execute_withdrawal(&f.user).unwrap();
    assert_eq!(vault.balance_of(&f.user).unwrap(), 75 * ONE);
}

#[test]
fn requests_are_independent_across_users() {
    let mut f = deploy_v3();
    let other = Address::from("other");
    f.token.mint(&other, 100 * ONE).unwrap();
    f.token.approve(&other, f.proxy.address(), Amount::MAX);
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    vault.deposit(&other, 100 * ONE).unwrap();
    vault.request_withdrawal(&f.user, 10 * ONE).unwrap();
    f.clock.advance_secs(DEFAULT_WITHDRAWAL_DELAY_SECS as i64);
    vault.request_withdrawal(&other, 10 * ONE).unwrap();

    vault.execute_withdrawal(&f.user).unwrap();
    assert!(matches!(
        vault.execute_withdrawal(&other),
        Err(VaultError::DelayNotElapsed { .. })
    ));
    assert!(vault.proxy().audit().is_ok());
}

#[test]
fn request_exceeding_balance_rejected() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    assert!(matches!(
        vault.request_withdrawal(&f.user, 96 * ONE),
        Err(VaultError::InvalidAmount { .. })
    ));
    assert!(vault.request_withdrawal(&f.user, 0).is_err());
    assert_eq!(vault.withdrawal_request(&f.user).unwrap(), None);
}

// ---------------------------------------------------------------------------
// Emergency exit
// ---------------------------------------------------------------------------

#[test]
fn emergency_withdraw_bypasses_delay() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    vault.request_withdrawal(&f.user, 50 * ONE).unwrap();
    vault.emergency_withdraw(&f.user).unwrap();

    assert_eq!(vault.balance_of(&f.user).unwrap(), 0);
    assert_eq!(vault.total_deposits().unwrap(), 0);
    assert_eq!(vault.ledger().balance_of(&f.user), 995 * ONE);
    assert_eq!(vault.withdrawal_request(&f.user).unwrap(), None);
    assert_eq!(vault.emergency_withdraw(&f.user).unwrap_err(), VaultError::ZeroBalance);
}

#[test]
fn delay_is_admin_configurable() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    assert!(matches!(
        vault.set_withdrawal_delay(&f.user, 0),
        Err(VaultError::Unauthorized(_))
    ));
    vault.set_withdrawal_delay(&f.admin, 60).unwrap();
    assert_eq!(vault.withdrawal_delay().unwrap(), 60);

    vault.request_withdrawal(&f.user, ONE).unwrap();
    f.clock.advance_secs(60);
    vault.execute_withdrawal(&f.user).unwrap();
}

#[test]
fn max_delay_freezes_requests_without_rejecting_them() {
    let mut f = deploy_v3();
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);
    vault.set_withdrawal_delay(&f.admin, u64::MAX).unwrap();

    let receipt = vault.request_withdrawal(&f.user, 50 * ONE).unwrap();
    assert!(matches!(
        receipt.events.as_slice(),
        [VaultEvent::WithdrawalRequested { amount, .. }] if *amount == 50 * ONE
    ));

    f.clock.advance_secs(10 * 365 * 24 * 3_600);
    assert!(matches!(
        vault.execute_withdrawal(&f.user),
        Err(VaultError::DelayNotElapsed { .. })
    ));
    assert_eq!(vault.balance_of(&f.user).unwrap(), 95 * ONE);

    vault.emergency_withdraw(&f.user).unwrap();
    assert_eq!(vault.balance_of(&f.user).unwrap(), 0);
}

#[test]
fn yield_still_claimable_under_v3() {
    let mut f = deploy_v3();
    f.clock.advance_secs(180 * 24 * 3_600);
    let mut vault = VaultClient::new(&mut f.proxy, &mut f.token);

    assert!(vault.user_yield(&f.user).unwrap() > 0);
    vault.claim_yield(&f.user).unwrap();
}
