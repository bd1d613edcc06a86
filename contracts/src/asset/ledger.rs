//! The interface between the vault and the fungible-asset ledger it
//! custodies.
//!
//! The vault only ever pulls (spending an allowance the depositor granted to
//! the vault) or pushes (from its own holdings). It never mints or burns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, Amount};

/// Errors reported by an asset ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The source account does not hold enough of the asset.
    #[error("insufficient balance: {account} holds {available}, needs {required}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// What it holds.
        available: Amount,
        /// What the transfer needed.
        required: Amount,
    },

    /// The spender has not been approved for enough of the owner's balance.
    #[error("insufficient allowance: {spender} may spend {allowed} of {owner}'s balance, needs {required}")]
    InsufficientAllowance {
        /// Account whose funds would move.
        owner: Address,
        /// Account trying to move them.
        spender: Address,
        /// Current allowance.
        allowed: Amount,
        /// What the transfer needed.
        required: Amount,
    },

    /// A credit would overflow the recipient's balance or the total supply.
    #[error("ledger overflow crediting {amount} to {account}")]
    Overflow {
        /// Account being credited.
        account: Address,
        /// Amount that did not fit.
        amount: Amount,
    },
}

/// Operations the vault needs from the asset it custodies.
pub trait AssetLedger {
    /// Identity of this ledger. Must match the asset recorded at tier-1
    /// initialization.
    fn asset_id(&self) -> &Address;

    /// Current asset balance of `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Pulls `amount` from `from` into `vault`, spending the allowance `from`
    /// granted to `vault`.
    fn transfer_in(&mut self, vault: &Address, from: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Pushes `amount` from the vault's holdings to `to`.
    fn transfer_out(&mut self, vault: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;
}

/// A single asset movement requested by a vault operation.
///
/// Logic revisions never talk to the ledger directly. They describe the
/// movement, and the proxy settles it after committing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetTransfer {
    /// Move `amount` from `from` into vault custody.
    Pull {
        /// Depositor.
        from: Address,
        /// Gross amount pulled.
        amount: Amount,
    },
    /// Move `amount` out of vault custody to `to`.
    Push {
        /// Recipient.
        to: Address,
        /// Amount paid out.
        amount: Amount,
    },
}

impl AssetTransfer {
    /// Executes this movement against `ledger` on behalf of `vault`.
    pub fn settle(&self, ledger: &mut dyn AssetLedger, vault: &Address) -> Result<(), LedgerError> {
        match self {
            AssetTransfer::Pull { from, amount } => ledger.transfer_in(vault, from, *amount),
            AssetTransfer::Push { to, amount } => ledger.transfer_out(vault, to, *amount),
        }
    }

    /// The amount moved.
    pub fn amount(&self) -> Amount {
        match self {
            AssetTransfer::Pull { amount, .. } | AssetTransfer::Push { amount, .. } => *amount,
        }
    }
}
