//! # Vault Proxy
//!
//! The proxy is the vault's stable identity. It owns the storage record and
//! a reference to the active logic revision, and routes every call through
//! the revision's dispatch table.
//!
//! ## Call pipeline
//!
//! ```text
//! call ─▶ resolve selector ─▶ snapshot ─▶ execute ─▶ commit ─▶ settle transfer
//!                 │                          │                       │
//!          UnsupportedOperation        error: restore          error: restore
//! ```
//!
//! State is committed before the ledger is touched. A ledger failure after
//! commit restores the snapshot, so callers only ever observe whole calls.
//!
//! ## Upgrades
//!
//! [`Proxy::upgrade_to_and_call`] runs the [`gate`], swaps the
//! implementation, then runs the bundled initializer against the new
//! revision. If the initializer fails, implementation, dispatch table, and
//! storage all revert to what they were.

pub mod client;
pub mod gate;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetLedger, AssetTransfer};
use crate::clock::Clock;
use crate::error::VaultError;
use crate::logic::call::{CallOutput, Operation, VaultCall};
use crate::logic::dispatch::DispatchTable;
use crate::logic::events::VaultEvent;
use crate::logic::{builtin, CallContext, Execution, VaultLogic};
use crate::storage::state::{InvariantViolation, VaultState};
use crate::types::{Address, Revision};

pub use client::VaultClient;
pub use gate::UpgradeRejection;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Persisted form of a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub address: Address,
    /// Active builtin revision.
    pub implementation: Revision,
    pub state: VaultState,
}

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReceipt {
    pub operation: Operation,
    pub output: CallOutput,
    pub events: Vec<VaultEvent>,
    /// Asset movement that was settled, if any.
    pub transfer: Option<AssetTransfer>,
}

// ---------------------------------------------------------------------------
// Proxy
// ---------------------------------------------------------------------------

/// A deployed vault.
#[derive(Debug)]
pub struct Proxy {
    address: Address,
    implementation: Arc<dyn VaultLogic>,
    dispatch: DispatchTable,
    state: VaultState,
    clock: Arc<dyn Clock>,
}

impl Proxy {
    fn new(address: Address, implementation: Arc<dyn VaultLogic>, state: VaultState, clock: Arc<dyn Clock>) -> Result<Self, VaultError> {
        let dispatch = DispatchTable::with_proxy_entry_points(implementation.interface())
            .map_err(UpgradeRejection::SelectorCollision)?;
        Ok(Self {
            address,
            implementation,
            dispatch,
            state,
            clock,
        })
    }

    /// Deploys a proxy in front of `logic` and runs `init`, if given, as
    /// `deployer`. Without an initializer the proxy is left uninitialized and
    /// the first tier-1 caller becomes admin.
    pub fn deploy(
        address: Address,
        logic: Arc<dyn VaultLogic>,
        clock: Arc<dyn Clock>,
        deployer: &Address,
        init: Option<VaultCall>,
    ) -> Result<(Self, Option<CallReceipt>), VaultError> {
        let mut proxy = Self::new(address, logic, VaultState::default(), clock)?;
        tracing::info!(
            address = %proxy.address,
            implementation = %proxy.implementation.revision(),
            "proxy deployed"
        );

        let receipt = match init {
            Some(call) => {
                if !call.is_initializer() {
                    return Err(UpgradeRejection::NotAnInitializer(call.operation().signature()).into());
                }
                let operation = call.operation();
                let execution = proxy.execute(deployer, &call)?;
                Some(CallReceipt {
                    operation,
                    output: execution.output,
                    events: execution.events,
                    transfer: None,
                })
            }
            None => None,
        };
        Ok((proxy, receipt))
    }

    /// Rebuilds a proxy from its persisted record.
    pub fn restore(record: ProxyRecord, clock: Arc<dyn Clock>) -> Result<Self, VaultError> {
        Self::new(record.address, builtin(record.implementation), record.state, clock)
    }

    /// Snapshot suitable for persistence.
    pub fn record(&self) -> ProxyRecord {
        ProxyRecord {
            address: self.address.clone(),
            implementation: self.implementation.revision(),
            state: self.state.clone(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Revision of the active implementation.
    pub fn implementation(&self) -> Revision {
        self.implementation.revision()
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Checks the storage invariants.
    pub fn audit(&self) -> Result<(), InvariantViolation> {
        self.state.audit()
    }

    /// Executes `call` as `caller`, settling any asset movement against
    /// `ledger`.
    pub fn call(&mut self, ledger: &mut dyn AssetLedger, caller: &Address, call: VaultCall) -> Result<CallReceipt, VaultError> {
        let operation = call.operation();
        let snapshot = self.state.clone();
        let execution = self.execute(caller, &call)?;

        if let Some(transfer) = &execution.transfer {
            if let Err(e) = self.settle(ledger, transfer) {
                tracing::warn!(operation = %operation, error = %e, "settlement failed, state restored");
                self.state = snapshot;
                return Err(e);
            }
        }

        Ok(CallReceipt {
            operation,
            output: execution.output,
            events: execution.events,
            transfer: execution.transfer,
        })
    }

    /// Evaluates `call` against a copy of storage. Nothing is committed and
    /// no asset moves.
    pub fn query(&self, caller: &Address, call: &VaultCall) -> Result<CallOutput, VaultError> {
        self.route(call)?;
        if call.operation().requires_initialization() {
            self.state.base.require_initialized()?;
        }
        let ctx = CallContext {
            caller,
            now: self.clock.now(),
            delegated: true,
            vault: &self.address,
        };
        let mut scratch = self.state.clone();
        Ok(self.implementation.execute(&ctx, &mut scratch, call)?.output)
    }

    /// Points the proxy at `logic` and, if given, runs `init` against it.
    /// Either everything happens or nothing does.
    pub fn upgrade_to_and_call(
        &mut self,
        caller: &Address,
        logic: Arc<dyn VaultLogic>,
        init: Option<VaultCall>,
    ) -> Result<CallReceipt, VaultError> {
        if let Some(call) = &init {
            if !call.is_initializer() {
                return Err(UpgradeRejection::NotAnInitializer(call.operation().signature()).into());
            }
        }

        let dispatch = gate::authorize_upgrade(self.implementation.as_ref(), &self.state, caller, logic.as_ref())?;

        let from = self.implementation.revision();
        let to = logic.revision();
        let previous_implementation = std::mem::replace(&mut self.implementation, logic);
        let previous_dispatch = std::mem::replace(&mut self.dispatch, dispatch);

        let mut events = vec![VaultEvent::Upgraded { from, to }];
        let mut output = CallOutput::None;
        if let Some(call) = init {
            match self.execute(caller, &call) {
                Ok(execution) => {
                    output = execution.output;
                    events.extend(execution.events);
                }
                Err(e) => {
                    self.implementation = previous_implementation;
                    self.dispatch = previous_dispatch;
                    tracing::warn!(%from, %to, error = %e, "upgrade initializer failed, implementation restored");
                    return Err(e);
                }
            }
        }

        tracing::info!(address = %self.address, %from, %to, "implementation upgraded");
        Ok(CallReceipt {
            operation: Operation::UpgradeToAndCall,
            output,
            events,
            transfer: None,
        })
    }

    // -- internals ----------------------------------------------------------

    fn route(&self, call: &VaultCall) -> Result<(), VaultError> {
        let operation = call.operation();
        match self.dispatch.resolve(call.selector()) {
            Some(entry) if entry.operation == operation && !Operation::PROXY_ENTRY_POINTS.contains(&operation) => Ok(()),
            _ => Err(VaultError::UnsupportedOperation {
                signature: operation.signature(),
                revision: self.implementation.revision(),
            }),
        }
    }

    /// Routes and executes `call`, restoring storage if it fails.
    fn execute(&mut self, caller: &Address, call: &VaultCall) -> Result<Execution, VaultError> {
        self.route(call)?;
        if call.operation().requires_initialization() {
            self.state.base.require_initialized()?;
        }

        tracing::debug!(operation = %call.operation(), selector = %call.selector(), caller = %caller, "dispatch");

        let ctx = CallContext {
            caller,
            now: self.clock.now(),
            delegated: true,
            vault: &self.address,
        };
        let mut scratch = self.state.clone();
        let execution = self.implementation.execute(&ctx, &mut scratch, call)?;
        self.state = scratch;
        Ok(execution)
    }

    fn settle(&self, ledger: &mut dyn AssetLedger, transfer: &AssetTransfer) -> Result<(), VaultError> {
        let asset = self.state.base.asset.as_ref().ok_or(VaultError::NotInitialized)?;
        if ledger.asset_id() != asset {
            return Err(VaultError::AssetMismatch {
                expected: asset.clone(),
                found: ledger.asset_id().clone(),
            });
        }
        transfer.settle(ledger, &self.address)?;
        Ok(())
    }
}
