//! # Mock Token
//!
//! An in-memory ERC-20-style ledger: balances, allowances, `transfer`,
//! `transferFrom`, and an unrestricted `mint` for seeding test accounts.
//!
//! It stands in for the external asset in tests and in the operator tooling.
//! Supply and balances are maintained with checked arithmetic; a failed
//! transfer leaves every balance and allowance untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ledger::{AssetLedger, LedgerError};
use crate::types::{Address, Amount};

/// In-memory fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockToken {
    /// Ledger identity (what the vault records as its asset).
    address: Address,
    /// Human-readable name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Display precision. Arithmetic never uses it.
    pub decimals: u8,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    /// `owner -> (spender -> allowance)`.
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl MockToken {
    /// Creates an empty token at a freshly generated address.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self::with_address(Address::generate("token"), name, symbol, decimals)
    }

    /// Creates an empty token at a fixed address.
    pub fn with_address(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// The token's address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Total minted supply.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Mints `amount` to `to`. Unrestricted; this is a test ledger.
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                account: to.clone(),
                amount,
            })?;
        self.credit(to, amount)?;
        self.total_supply = supply;
        Ok(())
    }

    /// Sets the allowance `spender` may move out of `owner`'s balance.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Remaining allowance of `spender` over `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|s| s.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Moves `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_credit(to, amount)?;
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                allowed,
                required: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.approve(from, spender, allowed - amount);
        Ok(())
    }

    fn debit(&mut self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                available,
                required: amount,
            });
        }
        self.balances.insert(account.clone(), available - amount);
        Ok(())
    }

    fn check_credit(&self, account: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance_of(account)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                account: account.clone(),
                amount,
            })
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        let new_balance = self.check_credit(account, amount)?;
        self.balances.insert(account.clone(), new_balance);
        Ok(())
    }
}

impl AssetLedger for MockToken {
    fn asset_id(&self) -> &Address {
        &self.address
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer_in(&mut self, vault: &Address, from: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.transfer_from(vault, from, vault, amount)
    }

    fn transfer_out(&mut self, vault: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.transfer(vault, to, amount)
    }
}
