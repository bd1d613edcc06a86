//! A logic revision deployed on its own.
//!
//! Every revision exists as a standalone instance before any proxy points
//! at it. Its own storage is never used for accounting, but anyone can call
//! it directly. Construction disables its initializers so nobody can become
//! admin of the bare instance.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::VaultError;
use crate::storage::state::VaultState;
use crate::types::{Address, Revision};

use super::call::{CallOutput, VaultCall};
use super::initializable::disable_initializers;
use super::{CallContext, VaultLogic};

/// A logic revision with its own, permanently uninitialized storage.
#[derive(Debug)]
pub struct BareInstance {
    address: Address,
    logic: Arc<dyn VaultLogic>,
    state: VaultState,
    clock: Arc<dyn Clock>,
}

impl BareInstance {
    /// Deploys `logic` at a fresh address with initializers disabled.
    pub fn deploy(logic: Arc<dyn VaultLogic>, clock: Arc<dyn Clock>) -> Self {
        let mut state = VaultState::default();
        disable_initializers(&mut state.base.initialized);
        let address = Address::generate("logic");
        tracing::debug!(address = %address, revision = %logic.revision(), "logic instance deployed");
        Self {
            address,
            logic,
            state,
            clock,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn revision(&self) -> Revision {
        self.logic.revision()
    }

    /// The shared logic handle, suitable for passing to an upgrade.
    pub fn logic(&self) -> Arc<dyn VaultLogic> {
        Arc::clone(&self.logic)
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    /// Calls the instance directly, outside any proxy. Failed calls leave
    /// its storage untouched.
    pub fn call(&mut self, caller: &Address, call: VaultCall) -> Result<CallOutput, VaultError> {
        if call.operation().requires_initialization() {
            self.state.base.require_initialized()?;
        }

        let ctx = CallContext {
            caller,
            now: self.clock.now(),
            delegated: false,
            vault: &self.address,
        };
        let mut scratch = self.state.clone();
        let execution = self.logic.execute(&ctx, &mut scratch, &call)?;
        self.state = scratch;
        Ok(execution.output)
    }
}
