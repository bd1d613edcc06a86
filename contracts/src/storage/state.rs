//! # Vault State: The Single Persistent Record
//!
//! `VaultState` is everything a proxy remembers across upgrades. It is split
//! into one group per revision, declared in slot order:
//!
//! ```text
//! VaultState
//! ├── base         (V1)  initialized, asset, roles, deposit_fee_bps, balances, total_deposits
//! ├── accrual      (V2)  yield_rate_bps, deposits_paused, deposit_timestamps, yield_activated_at
//! └── withdrawals  (V3)  withdrawal_delay_secs, withdrawal_requests
//! ```
//!
//! Field declaration order is the serialization order and must match
//! [`STORAGE_LAYOUT`](super::layout::STORAGE_LAYOUT). A revision's logic only
//! touches the groups it knows; a V1 proxy carries the later groups at their
//! defaults and never reads them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::RoleRegistry;
use crate::config::{is_valid_basis_points, INITIALIZERS_DISABLED};
use crate::error::VaultError;
use crate::types::{Address, Amount};

// ---------------------------------------------------------------------------
// Invariant audit
// ---------------------------------------------------------------------------

/// A broken invariant found by [`VaultState::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("total deposits {recorded} != sum of balances {summed}")]
    TotalMismatch { recorded: Amount, summed: Amount },

    #[error("sum of balances overflows")]
    BalanceSumOverflow,

    #[error("{field} = {value} is outside [0, 10000]")]
    BasisPointsOutOfRange { field: &'static str, value: u16 },
}

// ---------------------------------------------------------------------------
// V1 group
// ---------------------------------------------------------------------------

/// Slots 0..=5. Base accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSlots {
    /// Highest initialization tier completed, or the disabled marker.
    pub initialized: u8,
    /// The custodied asset. Set once by tier-1 initialization.
    pub asset: Option<Address>,
    pub roles: RoleRegistry,
    pub deposit_fee_bps: u16,
    /// Net entitlement per user. Zero balances are not stored.
    pub balances: BTreeMap<Address, Amount>,
    pub total_deposits: Amount,
}

impl BaseSlots {
    /// Tier-1 initialization has completed on a proxied record.
    pub fn is_initialized(&self) -> bool {
        self.initialized >= 1 && self.initialized != INITIALIZERS_DISABLED && self.asset.is_some()
    }

    pub fn require_initialized(&self) -> Result<(), VaultError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(VaultError::NotInitialized)
        }
    }

    pub fn balance_of(&self, user: &Address) -> Amount {
        self.balances.get(user).copied().unwrap_or(0)
    }

    /// Adds `amount` to `user`'s balance and to the total.
    pub fn credit(&mut self, user: &Address, amount: Amount) -> Result<Amount, VaultError> {
        let balance = self
            .balance_of(user)
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let total = self
            .total_deposits
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;

        if balance > 0 {
            self.balances.insert(user.clone(), balance);
        }
        self.total_deposits = total;
        Ok(balance)
    }

    /// Removes `amount` from `user`'s balance and from the total.
    pub fn debit(&mut self, user: &Address, amount: Amount) -> Result<Amount, VaultError> {
        let current = self.balance_of(user);
        let balance = current
            .checked_sub(amount)
            .ok_or_else(|| VaultError::invalid_amount(amount, "exceeds balance"))?;
        let total = self
            .total_deposits
            .checked_sub(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;

        if balance == 0 {
            self.balances.remove(user);
        } else {
            self.balances.insert(user.clone(), balance);
        }
        self.total_deposits = total;
        Ok(balance)
    }
}

// ---------------------------------------------------------------------------
// V2 group
// ---------------------------------------------------------------------------

/// Slots 6..=9. Yield accrual and the deposit pause switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualSlots {
    pub yield_rate_bps: u16,
    pub deposits_paused: bool,
    /// Start of yield accrual for each user's current balance.
    pub deposit_timestamps: BTreeMap<Address, DateTime<Utc>>,
    /// When tier-2 initialization ran. Balances that predate V2 accrue
    /// from here.
    pub yield_activated_at: Option<DateTime<Utc>>,
}

impl AccrualSlots {
    /// Instant from which `user`'s yield accrues, if any.
    pub fn accrual_start(&self, user: &Address) -> Option<DateTime<Utc>> {
        self.deposit_timestamps
            .get(user)
            .copied()
            .or(self.yield_activated_at)
    }
}

// ---------------------------------------------------------------------------
// V3 group
// ---------------------------------------------------------------------------

/// A pending two-phase withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: Amount,
    pub requested_at: DateTime<Utc>,
}

/// Slots 10..=11. Delayed withdrawals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalSlots {
    pub withdrawal_delay_secs: u64,
    /// At most one live request per user; a new request replaces the old.
    pub withdrawal_requests: BTreeMap<Address, WithdrawalRequest>,
}

// ---------------------------------------------------------------------------
// VaultState
// ---------------------------------------------------------------------------

/// The complete persistent record owned by a proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    pub base: BaseSlots,
    pub accrual: AccrualSlots,
    pub withdrawals: WithdrawalSlots,
}

impl VaultState {
    /// Checks the invariants that must hold after every call.
    pub fn audit(&self) -> Result<(), InvariantViolation> {
        let summed = self
            .base
            .balances
            .values()
            .try_fold(0 as Amount, |acc, b| acc.checked_add(*b))
            .ok_or(InvariantViolation::BalanceSumOverflow)?;
        if summed != self.base.total_deposits {
            return Err(InvariantViolation::TotalMismatch {
                recorded: self.base.total_deposits,
                summed,
            });
        }

        for (field, value) in [
            ("deposit_fee_bps", self.base.deposit_fee_bps),
            ("yield_rate_bps", self.accrual.yield_rate_bps),
        ] {
            if !is_valid_basis_points(value) {
                return Err(InvariantViolation::BasisPointsOutOfRange { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::layout::STORAGE_LAYOUT;

    #[test]
    fn serialized_field_order_matches_layout() {
        let json = serde_json::to_string(&VaultState::default()).unwrap();
        let mut last = 0;
        for slot in STORAGE_LAYOUT {
            let pos = json
                .find(&format!("\"{}\":", slot.name))
                .unwrap_or_else(|| panic!("slot {} missing from record", slot.name));
            assert!(pos >= last, "slot {} is out of order", slot.name);
            last = pos;
        }
    }

    #[test]
    fn credit_and_debit_keep_total_in_sync() {
        let mut base = BaseSlots::default();
        let alice = Address::from("alice");
        let bob = Address::from("bob");
        base.credit(&alice, 95).unwrap();
        base.credit(&bob, 10).unwrap();
        base.debit(&alice, 45).unwrap();
        assert_eq!(base.balance_of(&alice), 50);
        assert_eq!(base.total_deposits, 60);

        let state = VaultState {
            base,
            ..Default::default()
        };
        assert!(state.audit().is_ok());
    }

    #[test]
    fn debit_beyond_balance_leaves_state_untouched() {
        let mut base = BaseSlots::default();
        let alice = Address::from("alice");
        base.credit(&alice, 10).unwrap();
        let before = base.clone();
        let err = base.debit(&alice, 11).unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount { amount: 11, .. }));
        assert_eq!(base, before);
    }

    #[test]
    fn debit_to_zero_removes_entry() {
        let mut base = BaseSlots::default();
        let alice = Address::from("alice");
        base.credit(&alice, 10).unwrap();
        base.debit(&alice, 10).unwrap();
        assert!(base.balances.is_empty());
        assert_eq!(base.total_deposits, 0);
    }

    #[test]
    fn audit_detects_total_mismatch() {
        let mut state = VaultState::default();
        state.base.balances.insert(Address::from("alice"), 5);
        state.base.total_deposits = 6;
        assert_eq!(
            state.audit(),
            Err(InvariantViolation::TotalMismatch { recorded: 6, summed: 5 })
        );
    }

    #[test]
    fn accrual_falls_back_to_activation() {
        let activated = Utc::now();
        let accrual = AccrualSlots {
            yield_activated_at: Some(activated),
            ..Default::default()
        };
        assert_eq!(accrual.accrual_start(&Address::from("v1-depositor")), Some(activated));
        assert_eq!(AccrualSlots::default().accrual_start(&Address::from("x")), None);
    }

    #[test]
    fn disabled_record_is_not_initialized() {
        let base = BaseSlots {
            initialized: INITIALIZERS_DISABLED,
            asset: Some(Address::from("token")),
            ..Default::default()
        };
        assert!(!base.is_initialized());
    }
}
