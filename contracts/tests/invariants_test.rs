//! Storage invariants across a full vault lifecycle.
//!
//! Two users share one proxy while it is upgraded from V1 to V3. After every
//! state-changing call the recorded total must equal the sum of balances and
//! the vault must hold at least what it owes.

use std::sync::Arc;

use tokenvault_contracts::config::DEFAULT_WITHDRAWAL_DELAY_SECS;
use tokenvault_contracts::{
    builtin, Address, Amount, AssetLedger, ManualClock, MockToken, Proxy, Revision, VaultCall, VaultClient,
};

const ONE: Amount = 1_000_000_000_000_000_000;
const DAY: i64 = 24 * 3_600;

fn assert_consistent(proxy: &Proxy, token: &MockToken) {
    assert!(proxy.audit().is_ok(), "audit failed: {:?}", proxy.audit());
    let holdings = token.balance_of(proxy.address());
    assert!(
        holdings >= proxy.state().base.total_deposits,
        "vault holds {holdings} but owes {}",
        proxy.state().base.total_deposits
    );
}

#[test]
fn invariants_hold_through_mixed_two_user_lifecycle() {
    let admin = Address::from("admin");
    let alice = Address::from("alice");
    let bob = Address::from("bob");
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
    assert_consistent(&proxy, &token);

    for user in [&alice, &bob] {
        token.mint(user, 1_000 * ONE).unwrap();
        token.approve(user, proxy.address(), Amount::MAX);
    }

    // V1: deposits and a direct withdrawal.
    let mut vault = VaultClient::new(&mut proxy, &mut token);
    vault.deposit(&alice, 100 * ONE).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    vault.deposit(&bob, 200 * ONE).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    vault.withdraw(&alice, 45 * ONE).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    assert_eq!(vault.total_deposits().unwrap(), 240 * ONE);

    proxy
        .upgrade_to_and_call(&admin, builtin(Revision::V2), Some(VaultCall::InitializeV2 { yield_rate_bps: 500 }))
        .unwrap();
    assert_consistent(&proxy, &token);

    // V2: yield is paid from vault holdings and leaves principal untouched.
    clock.advance_secs(30 * DAY);
    let mut vault = VaultClient::new(&mut proxy, &mut token);
    vault.claim_yield(&alice).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    vault.claim_yield(&bob).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    vault.deposit(&bob, 10 * ONE).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    assert_eq!(vault.balance_of(&alice).unwrap(), 50 * ONE);
    assert_eq!(vault.balance_of(&bob).unwrap(), 199 * ONE + ONE / 2);

    proxy
        .upgrade_to_and_call(
            &admin,
            builtin(Revision::V3),
            Some(VaultCall::InitializeV3 {
                withdrawal_delay_secs: DEFAULT_WITHDRAWAL_DELAY_SECS,
            }),
        )
        .unwrap();
    assert_consistent(&proxy, &token);

    // V3: a delayed withdrawal for alice, an emergency exit for bob.
    let mut vault = VaultClient::new(&mut proxy, &mut token);
    vault.request_withdrawal(&alice, 30 * ONE).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    vault.request_withdrawal(&bob, 100 * ONE).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());

    clock.advance_secs(DEFAULT_WITHDRAWAL_DELAY_SECS as i64);
    vault.execute_withdrawal(&alice).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());
    vault.emergency_withdraw(&bob).unwrap();
    assert_consistent(vault.proxy(), vault.ledger());

    assert_eq!(vault.balance_of(&alice).unwrap(), 20 * ONE);
    assert_eq!(vault.balance_of(&bob).unwrap(), 0);
    assert_eq!(vault.total_deposits().unwrap(), 20 * ONE);
    assert_eq!(vault.withdrawal_request(&bob).unwrap(), None);
    assert_eq!(vault.withdrawal_request(&alice).unwrap(), None);
}
