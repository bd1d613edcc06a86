//! Typed convenience wrapper over [`Proxy::call`] and [`Proxy::query`].
//!
//! ```ignore
//! let mut client = VaultClient::new(&mut proxy, &mut token);
//! client.deposit(&user, 100)?;
//! assert_eq!(client.balance_of(&user)?, 95);
//! ```

use crate::access::DEFAULT_ADMIN_ROLE;
use crate::asset::AssetLedger;
use crate::error::VaultError;
use crate::logic::call::{CallOutput, Operation, VaultCall};
use crate::storage::state::WithdrawalRequest;
use crate::types::{Address, Amount};

use super::{CallReceipt, Proxy};

fn typed<T>(operation: Operation, value: Option<T>) -> Result<T, VaultError> {
    value.ok_or(VaultError::UnexpectedOutput {
        signature: operation.signature(),
    })
}

/// A proxy paired with the ledger it settles against.
pub struct VaultClient<'a, L: AssetLedger> {
    proxy: &'a mut Proxy,
    ledger: &'a mut L,
}

impl<'a, L: AssetLedger> VaultClient<'a, L> {
    pub fn new(proxy: &'a mut Proxy, ledger: &'a mut L) -> Self {
        Self { proxy, ledger }
    }

    pub fn proxy(&self) -> &Proxy {
        &*self.proxy
    }

    pub fn ledger(&self) -> &L {
        &*self.ledger
    }

    /// Sends a state-changing call.
    pub fn send(&mut self, caller: &Address, call: VaultCall) -> Result<CallReceipt, VaultError> {
        self.proxy.call(&mut *self.ledger, caller, call)
    }

    fn view(&self, call: VaultCall) -> Result<CallOutput, VaultError> {
        self.proxy.query(self.proxy.address(), &call)
    }

    // -- V1 -------------------------------------------------------------------

    pub fn deposit(&mut self, caller: &Address, amount: Amount) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::Deposit { amount })
    }

    pub fn withdraw(&mut self, caller: &Address, amount: Amount) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::Withdraw { amount })
    }

    pub fn set_deposit_fee(&mut self, caller: &Address, bps: u16) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::SetDepositFee { bps })
    }

    pub fn transfer_admin(&mut self, caller: &Address, new_admin: &Address) -> Result<CallReceipt, VaultError> {
        self.send(
            caller,
            VaultCall::TransferAdmin {
                new_admin: new_admin.clone(),
            },
        )
    }

    pub fn balance_of(&self, user: &Address) -> Result<Amount, VaultError> {
        let out = self.view(VaultCall::BalanceOf { user: user.clone() })?;
        typed(Operation::BalanceOf, out.into_amount())
    }

    pub fn total_deposits(&self) -> Result<Amount, VaultError> {
        typed(Operation::TotalDeposits, self.view(VaultCall::TotalDeposits)?.into_amount())
    }

    pub fn deposit_fee(&self) -> Result<u16, VaultError> {
        typed(Operation::GetDepositFee, self.view(VaultCall::GetDepositFee)?.into_basis_points())
    }

    pub fn asset(&self) -> Result<Option<Address>, VaultError> {
        typed(Operation::GetAsset, self.view(VaultCall::GetAsset)?.into_address())
    }

    pub fn admin(&self) -> Result<Option<Address>, VaultError> {
        typed(Operation::GetAdmin, self.view(VaultCall::GetAdmin)?.into_address())
    }

    /// Whether `account` holds the default admin role.
    pub fn is_admin(&self, account: &Address) -> Result<bool, VaultError> {
        let out = self.view(VaultCall::HasRole {
            role: DEFAULT_ADMIN_ROLE,
            account: account.clone(),
        })?;
        typed(Operation::HasRole, out.into_bool())
    }

    pub fn implementation_version(&self) -> Result<String, VaultError> {
        typed(
            Operation::GetImplementationVersion,
            self.view(VaultCall::GetImplementationVersion)?.into_text(),
        )
    }

    // -- V2 -------------------------------------------------------------------

    pub fn set_yield_rate(&mut self, caller: &Address, bps: u16) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::SetYieldRate { bps })
    }

    pub fn claim_yield(&mut self, caller: &Address) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::ClaimYield)
    }

    pub fn pause_deposits(&mut self, caller: &Address) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::PauseDeposits)
    }

    pub fn unpause_deposits(&mut self, caller: &Address) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::UnpauseDeposits)
    }

    pub fn yield_rate(&self) -> Result<u16, VaultError> {
        typed(Operation::GetYieldRate, self.view(VaultCall::GetYieldRate)?.into_basis_points())
    }

    pub fn user_yield(&self, user: &Address) -> Result<Amount, VaultError> {
        let out = self.view(VaultCall::GetUserYield { user: user.clone() })?;
        typed(Operation::GetUserYield, out.into_amount())
    }

    pub fn is_deposits_paused(&self) -> Result<bool, VaultError> {
        typed(Operation::IsDepositsPaused, self.view(VaultCall::IsDepositsPaused)?.into_bool())
    }

    // -- V3 -------------------------------------------------------------------

    pub fn set_withdrawal_delay(&mut self, caller: &Address, secs: u64) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::SetWithdrawalDelay { secs })
    }

    pub fn request_withdrawal(&mut self, caller: &Address, amount: Amount) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::RequestWithdrawal { amount })
    }

    pub fn execute_withdrawal(&mut self, caller: &Address) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::ExecuteWithdrawal)
    }

    pub fn emergency_withdraw(&mut self, caller: &Address) -> Result<CallReceipt, VaultError> {
        self.send(caller, VaultCall::EmergencyWithdraw)
    }

    pub fn withdrawal_delay(&self) -> Result<u64, VaultError> {
        typed(
            Operation::GetWithdrawalDelay,
            self.view(VaultCall::GetWithdrawalDelay)?.into_seconds(),
        )
    }

    pub fn withdrawal_request(&self, user: &Address) -> Result<Option<WithdrawalRequest>, VaultError> {
        let out = self.view(VaultCall::GetWithdrawalRequest { user: user.clone() })?;
        typed(Operation::GetWithdrawalRequest, out.into_request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MockToken;
    use crate::clock::SystemClock;
    use crate::logic::builtin;
    use crate::types::Revision;
    use std::sync::Arc;

    #[test]
    fn typed_views_through_client() {
        let admin = Address::from("admin");
        let user = Address::from("user");
        let mut token = MockToken::new("Mock", "MOCK", 18);
        let (mut proxy, _) = Proxy::deploy(
            Address::from("vault"),
            builtin(Revision::V1),
            Arc::new(SystemClock),
            &admin,
            Some(VaultCall::Initialize {
                asset: token.address().clone(),
                admin: admin.clone(),
                deposit_fee_bps: 500,
            }),
        )
        .unwrap();
        token.mint(&user, 100).unwrap();
        token.approve(&user, proxy.address(), 100);

        let mut client = VaultClient::new(&mut proxy, &mut token);
        client.deposit(&user, 100).unwrap();
        assert_eq!(client.balance_of(&user).unwrap(), 95);
        assert_eq!(client.total_deposits().unwrap(), 95);
        assert_eq!(client.deposit_fee().unwrap(), 500);
        assert!(client.is_admin(&admin).unwrap());
        assert_eq!(client.implementation_version().unwrap(), "V1");
        assert!(matches!(
            client.yield_rate(),
            Err(VaultError::UnsupportedOperation { .. })
        ));
    }
}
