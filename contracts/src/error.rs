//! Vault error type.
//!
//! Every vault operation returns `Result<_, VaultError>`. A returned error
//! means the whole call was rolled back: no balance, role, request, or
//! ledger movement from that call survives.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::access::AccessError;
use crate::asset::LedgerError;
use crate::proxy::gate::UpgradeRejection;
use crate::types::{Address, Amount, Revision};

/// Errors returned by vault operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The initializer for this tier has already run (or initializers are
    /// disabled on this instance).
    #[error("already initialized: tier {tier} initializer cannot run again")]
    AlreadyInitialized {
        /// Tier whose initializer was invoked.
        tier: u8,
    },

    /// A tier initializer was invoked before its predecessor completed.
    #[error("initializer out of order: tier {tier} requires tier {required}, vault is at tier {found}")]
    InitializerOutOfOrder {
        /// Tier whose initializer was invoked.
        tier: u8,
        /// Tier that must already be complete.
        required: u8,
        /// Tier the vault is actually at.
        found: u8,
    },

    /// An initializer was invoked on a logic instance directly instead of
    /// through a proxy.
    #[error("initializers can only run through the proxy")]
    NotDelegated,

    /// The vault has not completed tier-1 initialization.
    #[error("vault is not initialized")]
    NotInitialized,

    /// The caller lacks the role the operation requires.
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    /// Zero amount, or more than the caller's balance.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// Amount supplied by the caller.
        amount: Amount,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A basis-point parameter above 10_000.
    #[error("invalid basis points {0}: must be at most 10000")]
    InvalidBasisPoints(u16),

    /// Deposits are paused.
    #[error("deposits paused")]
    DepositsPaused,

    /// The caller has no accrued yield to claim.
    #[error("no yield available")]
    NoYieldAvailable,

    /// The caller has no live withdrawal request.
    #[error("no withdrawal request")]
    NoWithdrawalRequest,

    /// The caller's request is not executable yet.
    #[error("withdrawal delay not elapsed: executable at {ready_at}")]
    DelayNotElapsed {
        /// Earliest instant the request can execute.
        ready_at: DateTime<Utc>,
    },

    /// Emergency withdrawal with nothing to withdraw.
    #[error("zero balance")]
    ZeroBalance,

    /// The upgrade gate refused a new implementation.
    #[error("upgrade rejected: {0}")]
    UpgradeRejected(#[from] UpgradeRejection),

    /// The active implementation does not dispatch this operation.
    #[error("operation {signature} is not supported by implementation {revision}")]
    UnsupportedOperation {
        /// Canonical signature of the attempted operation.
        signature: &'static str,
        /// Active revision.
        revision: Revision,
    },

    /// Checked arithmetic failed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// The asset ledger refused a pull or push.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The ledger handed to the vault is not the asset it custodies.
    #[error("asset mismatch: vault custodies {expected}, got {found}")]
    AssetMismatch {
        /// Asset recorded at initialization.
        expected: Address,
        /// Ledger actually supplied.
        found: Address,
    },

    /// An operation returned a different kind of output than its signature
    /// promises.
    #[error("unexpected output from {signature}")]
    UnexpectedOutput {
        /// Canonical signature of the operation.
        signature: &'static str,
    },
}

impl VaultError {
    pub(crate) fn invalid_amount(amount: Amount, reason: &'static str) -> Self {
        VaultError::InvalidAmount { amount, reason }
    }
}
