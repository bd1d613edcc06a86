//! # Vault Logic Revisions
//!
//! A logic revision is stateless behavior. It owns no storage: the proxy
//! lends it the [`VaultState`] for one call, and it hands back an
//! [`Execution`] describing the result, the events it produced, and at most
//! one asset movement for the proxy to settle.
//!
//! ```text
//! v1.rs            - base deposit/withdraw accounting, fees, admin role
//! v2.rs            - V1 + yield accrual and pausable deposits
//! v3.rs            - V2 + two-phase and emergency withdrawals
//! initializable.rs - tiered initializer guard
//! instance.rs      - a logic revision deployed on its own, outside a proxy
//! call.rs          - operations, selectors, call and output types
//! dispatch.rs      - selector routing tables and collision detection
//! events.rs        - events emitted by successful calls
//! math.rs          - fee and yield formulas
//! ```
//!
//! Revisions extend each other by delegation: V3 handles what it adds and
//! passes everything else to V2, which does the same with V1.

pub mod call;
pub mod dispatch;
pub mod events;
pub mod initializable;
pub mod instance;
pub mod math;
pub mod v1;
pub mod v2;
pub mod v3;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::access::{AccessError, Role};
use crate::asset::AssetTransfer;
use crate::config::IMPLEMENTATION_SLOT;
use crate::error::VaultError;
use crate::storage::layout::{layout_for, SlotDescriptor};
use crate::storage::state::VaultState;
use crate::types::{Address, Revision};

pub use call::{CallOutput, Operation, Selector, VaultCall};
pub use dispatch::{DispatchTable, InterfaceEntry, SelectorCollision};
pub use events::VaultEvent;
pub use v1::TokenVaultV1;
pub use v2::TokenVaultV2;
pub use v3::TokenVaultV3;

// ---------------------------------------------------------------------------
// Call context and result
// ---------------------------------------------------------------------------

/// Ambient facts about the call being executed.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Principal that issued the call.
    pub caller: &'a Address,
    /// Logical time of the call.
    pub now: DateTime<Utc>,
    /// `true` when running through a proxy against proxy storage.
    pub delegated: bool,
    /// Address that custodies the asset.
    pub vault: &'a Address,
}

/// What a successful call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: CallOutput,
    /// Asset movement to settle after state is committed.
    pub transfer: Option<AssetTransfer>,
    pub events: Vec<VaultEvent>,
}

impl Execution {
    /// A result with no side effects beyond `output`.
    pub fn view(output: CallOutput) -> Self {
        Self {
            output,
            transfer: None,
            events: Vec::new(),
        }
    }

    /// A state change with no return value.
    pub fn effect(event: VaultEvent) -> Self {
        Self {
            output: CallOutput::None,
            transfer: None,
            events: vec![event],
        }
    }

    pub fn with_transfer(mut self, transfer: AssetTransfer) -> Self {
        self.transfer = Some(transfer);
        self
    }
}

// ---------------------------------------------------------------------------
// VaultLogic
// ---------------------------------------------------------------------------

/// A deployable logic revision.
///
/// The defaults describe a well-behaved revision: it declares the builtin
/// layout and surface for its tag, reports the implementation slot, and lets
/// only the admin authorize an upgrade away from it.
pub trait VaultLogic: Send + Sync + fmt::Debug {
    /// Tag reported by `getImplementationVersion()`.
    fn revision(&self) -> Revision;

    /// Storage slots this revision reads and writes.
    fn layout(&self) -> &'static [SlotDescriptor] {
        layout_for(self.revision())
    }

    /// Operations this revision dispatches.
    fn interface(&self) -> Vec<InterfaceEntry> {
        Operation::surface(self.revision())
            .into_iter()
            .map(InterfaceEntry::of)
            .collect()
    }

    /// Slot identifier this revision expects to be stored under.
    fn proxiable_uuid(&self) -> [u8; 32] {
        IMPLEMENTATION_SLOT
    }

    /// Checked by the active revision before the proxy is pointed elsewhere.
    fn authorize_upgrade(&self, state: &VaultState, caller: &Address) -> Result<(), AccessError> {
        state.base.roles.require_role(Role::DefaultAdmin, caller)
    }

    /// Runs `call` against `state`.
    fn execute(&self, ctx: &CallContext<'_>, state: &mut VaultState, call: &VaultCall) -> Result<Execution, VaultError>;
}

/// The builtin logic for `revision`.
pub fn builtin(revision: Revision) -> Arc<dyn VaultLogic> {
    match revision {
        Revision::V1 => Arc::new(TokenVaultV1),
        Revision::V2 => Arc::new(TokenVaultV2),
        Revision::V3 => Arc::new(TokenVaultV3),
    }
}

/// Error for an operation that `revision` does not dispatch.
pub(crate) fn unsupported(call: &VaultCall, revision: Revision) -> VaultError {
    VaultError::UnsupportedOperation {
        signature: call.operation().signature(),
        revision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_report_their_revision() {
        for revision in Revision::ALL {
            let logic = builtin(revision);
            assert_eq!(logic.revision(), revision);
            assert_eq!(logic.layout(), layout_for(revision));
            assert_eq!(logic.proxiable_uuid(), IMPLEMENTATION_SLOT);
        }
    }

    #[test]
    fn default_authorization_requires_admin() {
        let mut state = VaultState::default();
        state.base.roles.grant_initial_admin(Address::from("admin")).unwrap();
        let logic = builtin(Revision::V1);
        assert!(logic.authorize_upgrade(&state, &Address::from("admin")).is_ok());
        assert!(logic.authorize_upgrade(&state, &Address::from("mallory")).is_err());
    }
}
