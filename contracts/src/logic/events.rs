//! Events emitted by vault operations.
//!
//! Events are returned in the call receipt and appended to the persisted
//! event log. They are only produced by calls that succeed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, Revision};

/// Something that happened to a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// An initialization tier completed.
    Initialized { tier: u8 },
    Deposited {
        user: Address,
        /// Amount pulled from the depositor.
        gross: Amount,
        /// Amount retained as the deposit fee.
        fee: Amount,
        /// Amount credited to the depositor's balance.
        net: Amount,
    },
    Withdrawn { user: Address, amount: Amount },
    DepositFeeUpdated { old_bps: u16, new_bps: u16 },
    AdminTransferred { previous: Address, new_admin: Address },
    YieldClaimed { user: Address, amount: Amount },
    YieldRateUpdated { old_bps: u16, new_bps: u16 },
    DepositsPaused { by: Address },
    DepositsUnpaused { by: Address },
    WithdrawalRequested {
        user: Address,
        amount: Amount,
        /// Earliest execution time under the delay in force when requested.
        ready_at: DateTime<Utc>,
    },
    WithdrawalExecuted { user: Address, amount: Amount },
    EmergencyWithdrawn { user: Address, amount: Amount },
    WithdrawalDelayUpdated { old_secs: u64, new_secs: u64 },
    Upgraded { from: Revision, to: Revision },
}

impl VaultEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::Initialized { .. } => "Initialized",
            VaultEvent::Deposited { .. } => "Deposited",
            VaultEvent::Withdrawn { .. } => "Withdrawn",
            VaultEvent::DepositFeeUpdated { .. } => "DepositFeeUpdated",
            VaultEvent::AdminTransferred { .. } => "AdminTransferred",
            VaultEvent::YieldClaimed { .. } => "YieldClaimed",
            VaultEvent::YieldRateUpdated { .. } => "YieldRateUpdated",
            VaultEvent::DepositsPaused { .. } => "DepositsPaused",
            VaultEvent::DepositsUnpaused { .. } => "DepositsUnpaused",
            VaultEvent::WithdrawalRequested { .. } => "WithdrawalRequested",
            VaultEvent::WithdrawalExecuted { .. } => "WithdrawalExecuted",
            VaultEvent::EmergencyWithdrawn { .. } => "EmergencyWithdrawn",
            VaultEvent::WithdrawalDelayUpdated { .. } => "WithdrawalDelayUpdated",
            VaultEvent::Upgraded { .. } => "Upgraded",
        }
    }
}
