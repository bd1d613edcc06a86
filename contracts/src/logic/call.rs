//! # Operations, Selectors, and Calls
//!
//! Every externally callable vault operation has a canonical signature, e.g.
//! `deposit(uint256)`. Its dispatch selector is the first four bytes of the
//! SHA-256 digest of that signature. The proxy routes a [`VaultCall`] by its
//! selector, never by the enum variant, so that two revisions disagreeing on
//! what a selector means is something the upgrade gate can see.
//!
//! ```text
//! VaultCall ──operation()──▶ Operation ──signature()──▶ "deposit(uint256)"
//!                                      ──selector()───▶ 0x1a2b3c4d
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SELECTOR_LENGTH;
use crate::storage::state::WithdrawalRequest;
use crate::types::{Address, Amount, Revision};

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Four-byte dispatch identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Selector(pub [u8; SELECTOR_LENGTH]);

impl Selector {
    /// Selector of a canonical signature.
    pub fn of(signature: &str) -> Self {
        let digest = Sha256::digest(signature.as_bytes());
        let mut bytes = [0u8; SELECTOR_LENGTH];
        bytes.copy_from_slice(&digest[..SELECTOR_LENGTH]);
        Selector(bytes)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Every operation any revision exposes, plus the proxy's upgrade entry
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operation {
    // -- initializers
    Initialize,
    InitializeV2,
    InitializeV3,
    // -- V1 accounting
    Deposit,
    Withdraw,
    BalanceOf,
    TotalDeposits,
    GetDepositFee,
    SetDepositFee,
    // -- V1 roles and introspection
    GetAsset,
    GetAdmin,
    HasRole,
    TransferAdmin,
    GetImplementationVersion,
    // -- upgrade interface
    UpgradeInterfaceVersion,
    ProxiableUuid,
    UpgradeToAndCall,
    // -- V2
    SetYieldRate,
    GetYieldRate,
    GetUserYield,
    ClaimYield,
    PauseDeposits,
    UnpauseDeposits,
    IsDepositsPaused,
    // -- V3
    SetWithdrawalDelay,
    GetWithdrawalDelay,
    RequestWithdrawal,
    GetWithdrawalRequest,
    ExecuteWithdrawal,
    EmergencyWithdraw,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 30] = [
        Operation::Initialize,
        Operation::InitializeV2,
        Operation::InitializeV3,
        Operation::Deposit,
        Operation::Withdraw,
        Operation::BalanceOf,
        Operation::TotalDeposits,
        Operation::GetDepositFee,
        Operation::SetDepositFee,
        Operation::GetAsset,
        Operation::GetAdmin,
        Operation::HasRole,
        Operation::TransferAdmin,
        Operation::GetImplementationVersion,
        Operation::UpgradeInterfaceVersion,
        Operation::ProxiableUuid,
        Operation::UpgradeToAndCall,
        Operation::SetYieldRate,
        Operation::GetYieldRate,
        Operation::GetUserYield,
        Operation::ClaimYield,
        Operation::PauseDeposits,
        Operation::UnpauseDeposits,
        Operation::IsDepositsPaused,
        Operation::SetWithdrawalDelay,
        Operation::GetWithdrawalDelay,
        Operation::RequestWithdrawal,
        Operation::GetWithdrawalRequest,
        Operation::ExecuteWithdrawal,
        Operation::EmergencyWithdraw,
    ];

    /// Operations the proxy itself serves, regardless of implementation.
    pub const PROXY_ENTRY_POINTS: [Operation; 1] = [Operation::UpgradeToAndCall];

    /// Canonical signature.
    pub fn signature(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize(address,address,uint16)",
            Operation::InitializeV2 => "initializeV2(uint16)",
            Operation::InitializeV3 => "initializeV3(uint64)",
            Operation::Deposit => "deposit(uint256)",
            Operation::Withdraw => "withdraw(uint256)",
            Operation::BalanceOf => "balanceOf(address)",
            Operation::TotalDeposits => "totalDeposits()",
            Operation::GetDepositFee => "getDepositFee()",
            Operation::SetDepositFee => "setDepositFee(uint16)",
            Operation::GetAsset => "getAsset()",
            Operation::GetAdmin => "getAdmin()",
            Operation::HasRole => "hasRole(bytes32,address)",
            Operation::TransferAdmin => "transferAdmin(address)",
            Operation::GetImplementationVersion => "getImplementationVersion()",
            Operation::UpgradeInterfaceVersion => "UPGRADE_INTERFACE_VERSION()",
            Operation::ProxiableUuid => "proxiableUUID()",
            Operation::UpgradeToAndCall => "upgradeToAndCall(address,bytes)",
            Operation::SetYieldRate => "setYieldRate(uint16)",
            Operation::GetYieldRate => "getYieldRate()",
            Operation::GetUserYield => "getUserYield(address)",
            Operation::ClaimYield => "claimYield()",
            Operation::PauseDeposits => "pauseDeposits()",
            Operation::UnpauseDeposits => "unpauseDeposits()",
            Operation::IsDepositsPaused => "isDepositsPaused()",
            Operation::SetWithdrawalDelay => "setWithdrawalDelay(uint64)",
            Operation::GetWithdrawalDelay => "getWithdrawalDelay()",
            Operation::RequestWithdrawal => "requestWithdrawal(uint256)",
            Operation::GetWithdrawalRequest => "getWithdrawalRequest(address)",
            Operation::ExecuteWithdrawal => "executeWithdrawal()",
            Operation::EmergencyWithdraw => "emergencyWithdraw()",
        }
    }

    pub fn selector(self) -> Selector {
        Selector::of(self.signature())
    }

    /// First revision that exposes this operation.
    pub fn introduced_in(self) -> Revision {
        match self {
            Operation::InitializeV2
            | Operation::SetYieldRate
            | Operation::GetYieldRate
            | Operation::GetUserYield
            | Operation::ClaimYield
            | Operation::PauseDeposits
            | Operation::UnpauseDeposits
            | Operation::IsDepositsPaused => Revision::V2,
            Operation::InitializeV3
            | Operation::SetWithdrawalDelay
            | Operation::GetWithdrawalDelay
            | Operation::RequestWithdrawal
            | Operation::GetWithdrawalRequest
            | Operation::ExecuteWithdrawal
            | Operation::EmergencyWithdraw => Revision::V3,
            _ => Revision::V1,
        }
    }

    pub fn is_initializer(self) -> bool {
        matches!(
            self,
            Operation::Initialize | Operation::InitializeV2 | Operation::InitializeV3
        )
    }

    /// Whether the vault must have completed tier-1 initialization before
    /// this operation can run.
    pub fn requires_initialization(self) -> bool {
        !self.is_initializer()
            && !matches!(
                self,
                Operation::GetImplementationVersion
                    | Operation::UpgradeInterfaceVersion
                    | Operation::ProxiableUuid
            )
    }

    /// The operations a revision's implementation dispatches. Proxy entry
    /// points are not included.
    pub fn surface(revision: Revision) -> Vec<Operation> {
        Operation::ALL
            .iter()
            .copied()
            .filter(|op| !Operation::PROXY_ENTRY_POINTS.contains(op))
            .filter(|op| op.introduced_in() <= revision)
            .collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

// ---------------------------------------------------------------------------
// VaultCall
// ---------------------------------------------------------------------------

/// A decoded call: an operation together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultCall {
    Initialize {
        asset: Address,
        admin: Address,
        deposit_fee_bps: u16,
    },
    InitializeV2 {
        yield_rate_bps: u16,
    },
    InitializeV3 {
        withdrawal_delay_secs: u64,
    },
    Deposit {
        amount: Amount,
    },
    Withdraw {
        amount: Amount,
    },
    BalanceOf {
        user: Address,
    },
    TotalDeposits,
    GetDepositFee,
    SetDepositFee {
        bps: u16,
    },
    GetAsset,
    GetAdmin,
    HasRole {
        role: [u8; 32],
        account: Address,
    },
    TransferAdmin {
        new_admin: Address,
    },
    GetImplementationVersion,
    UpgradeInterfaceVersion,
    ProxiableUuid,
    SetYieldRate {
        bps: u16,
    },
    GetYieldRate,
    GetUserYield {
        user: Address,
    },
    ClaimYield,
    PauseDeposits,
    UnpauseDeposits,
    IsDepositsPaused,
    SetWithdrawalDelay {
        secs: u64,
    },
    GetWithdrawalDelay,
    RequestWithdrawal {
        amount: Amount,
    },
    GetWithdrawalRequest {
        user: Address,
    },
    ExecuteWithdrawal,
    EmergencyWithdraw,
}

impl VaultCall {
    pub fn operation(&self) -> Operation {
        match self {
            VaultCall::Initialize { .. } => Operation::Initialize,
            VaultCall::InitializeV2 { .. } => Operation::InitializeV2,
            VaultCall::InitializeV3 { .. } => Operation::InitializeV3,
            VaultCall::Deposit { .. } => Operation::Deposit,
            VaultCall::Withdraw { .. } => Operation::Withdraw,
            VaultCall::BalanceOf { .. } => Operation::BalanceOf,
            VaultCall::TotalDeposits => Operation::TotalDeposits,
            VaultCall::GetDepositFee => Operation::GetDepositFee,
            VaultCall::SetDepositFee { .. } => Operation::SetDepositFee,
            VaultCall::GetAsset => Operation::GetAsset,
            VaultCall::GetAdmin => Operation::GetAdmin,
            VaultCall::HasRole { .. } => Operation::HasRole,
            VaultCall::TransferAdmin { .. } => Operation::TransferAdmin,
            VaultCall::GetImplementationVersion => Operation::GetImplementationVersion,
            VaultCall::UpgradeInterfaceVersion => Operation::UpgradeInterfaceVersion,
            VaultCall::ProxiableUuid => Operation::ProxiableUuid,
            VaultCall::SetYieldRate { .. } => Operation::SetYieldRate,
            VaultCall::GetYieldRate => Operation::GetYieldRate,
            VaultCall::GetUserYield { .. } => Operation::GetUserYield,
            VaultCall::ClaimYield => Operation::ClaimYield,
            VaultCall::PauseDeposits => Operation::PauseDeposits,
            VaultCall::UnpauseDeposits => Operation::UnpauseDeposits,
            VaultCall::IsDepositsPaused => Operation::IsDepositsPaused,
            VaultCall::SetWithdrawalDelay { .. } => Operation::SetWithdrawalDelay,
            VaultCall::GetWithdrawalDelay => Operation::GetWithdrawalDelay,
            VaultCall::RequestWithdrawal { .. } => Operation::RequestWithdrawal,
            VaultCall::GetWithdrawalRequest { .. } => Operation::GetWithdrawalRequest,
            VaultCall::ExecuteWithdrawal => Operation::ExecuteWithdrawal,
            VaultCall::EmergencyWithdraw => Operation::EmergencyWithdraw,
        }
    }

    pub fn selector(&self) -> Selector {
        self.operation().selector()
    }

    pub fn is_initializer(&self) -> bool {
        self.operation().is_initializer()
    }
}

// ---------------------------------------------------------------------------
// CallOutput
// ---------------------------------------------------------------------------

/// Return value of a vault operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    /// State-changing operations without a return value.
    None,
    Amount(Amount),
    Bool(bool),
    BasisPoints(u16),
    Seconds(u64),
    Text(String),
    Bytes32([u8; 32]),
    Address(Option<Address>),
    Request(Option<WithdrawalRequest>),
}

impl CallOutput {
    pub fn into_amount(self) -> Option<Amount> {
        match self {
            CallOutput::Amount(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            CallOutput::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_basis_points(self) -> Option<u16> {
        match self {
            CallOutput::BasisPoints(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_seconds(self) -> Option<u64> {
        match self {
            CallOutput::Seconds(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            CallOutput::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_bytes32(self) -> Option<[u8; 32]> {
        match self {
            CallOutput::Bytes32(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_address(self) -> Option<Option<Address>> {
        match self {
            CallOutput::Address(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_request(self) -> Option<Option<WithdrawalRequest>> {
        match self {
            CallOutput::Request(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn selectors_are_distinct() {
        let selectors: HashSet<Selector> = Operation::ALL.iter().map(|op| op.selector()).collect();
        assert_eq!(selectors.len(), Operation::ALL.len());
    }

    #[test]
    fn selector_is_a_prefix_of_the_digest() {
        let digest = Sha256::digest(b"deposit(uint256)");
        assert_eq!(Operation::Deposit.selector().0, digest[..4]);
        assert_eq!(Operation::Deposit.selector().to_string().len(), 2 + 8);
    }

    #[test]
    fn surfaces_grow_monotonically() {
        let v1 = Operation::surface(Revision::V1);
        let v2 = Operation::surface(Revision::V2);
        let v3 = Operation::surface(Revision::V3);
        assert!(v1.iter().all(|op| v2.contains(op)));
        assert!(v2.iter().all(|op| v3.contains(op)));
        assert!(!v1.contains(&Operation::ClaimYield));
        assert!(v2.contains(&Operation::ClaimYield));
        assert!(!v2.contains(&Operation::ExecuteWithdrawal));
        assert_eq!(v3.len(), Operation::ALL.len() - Operation::PROXY_ENTRY_POINTS.len());
    }

    #[test]
    fn introspection_does_not_require_initialization() {
        assert!(!Operation::GetImplementationVersion.requires_initialization());
        assert!(!Operation::Initialize.requires_initialization());
        assert!(Operation::Deposit.requires_initialization());
        assert!(Operation::BalanceOf.requires_initialization());
    }

    #[test]
    fn call_maps_to_its_operation() {
        let call = VaultCall::RequestWithdrawal { amount: 50 };
        assert_eq!(call.operation(), Operation::RequestWithdrawal);
        assert_eq!(call.selector(), Operation::RequestWithdrawal.selector());
        assert!(VaultCall::InitializeV3 { withdrawal_delay_secs: 1 }.is_initializer());
    }

    #[test]
    fn output_accessors_check_kind() {
        assert_eq!(CallOutput::Amount(5).into_amount(), Some(5));
        assert_eq!(CallOutput::Bool(true).into_amount(), None);
        assert_eq!(CallOutput::Text("V1".into()).into_text().as_deref(), Some("V1"));
    }
}
