//! # Upgrade Authorization Gate
//!
//! Runs before a proxy is pointed at a new implementation. Every check is
//! read-only; the proxy only swaps once all of them pass.
//!
//! ```text
//! 1. proxy initialized?             ── NotInitialized
//! 2. current.authorize_upgrade()    ── Unauthorized      (admin role)
//! 3. incoming.proxiable_uuid()      ── NotProxiable      (implementation slot)
//! 4. check_append_only(layouts)     ── Layout            (append-only storage)
//! 5. DispatchTable::build()         ── SelectorCollision (proxy entry points included)
//! ```

use thiserror::Error;

use crate::access::AccessError;
use crate::config::IMPLEMENTATION_SLOT;
use crate::logic::dispatch::{DispatchTable, SelectorCollision};
use crate::logic::VaultLogic;
use crate::storage::layout::{check_append_only, LayoutError};
use crate::storage::state::VaultState;
use crate::types::Address;

/// Why an upgrade was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeRejection {
    #[error("caller may not authorize upgrades: {0}")]
    Unauthorized(AccessError),

    #[error("proxy has not been initialized")]
    NotInitialized,

    /// The incoming implementation reports a different slot identifier.
    #[error("implementation is not proxiable: reports {reported}")]
    NotProxiable { reported: String },

    #[error("storage layout incompatible: {0}")]
    Layout(LayoutError),

    #[error(transparent)]
    SelectorCollision(SelectorCollision),

    /// The call bundled with the upgrade is not an initializer.
    #[error("{0} cannot be bundled with an upgrade")]
    NotAnInitializer(&'static str),
}

/// Validates moving a proxy from `current` to `incoming` and returns the
/// dispatch table the proxy should route through afterwards.
pub fn authorize_upgrade(
    current: &dyn VaultLogic,
    state: &VaultState,
    caller: &Address,
    incoming: &dyn VaultLogic,
) -> Result<DispatchTable, UpgradeRejection> {
    let from = current.revision();
    let to = incoming.revision();

    let result = run_checks(current, state, caller, incoming);
    match &result {
        Ok(_) => tracing::info!(%from, %to, caller = %caller, "upgrade authorized"),
        Err(e) => tracing::warn!(%from, %to, caller = %caller, error = %e, "upgrade rejected"),
    }
    result
}

fn run_checks(
    current: &dyn VaultLogic,
    state: &VaultState,
    caller: &Address,
    incoming: &dyn VaultLogic,
) -> Result<DispatchTable, UpgradeRejection> {
    if !state.base.is_initialized() {
        return Err(UpgradeRejection::NotInitialized);
    }

    current
        .authorize_upgrade(state, caller)
        .map_err(UpgradeRejection::Unauthorized)?;

    let reported = incoming.proxiable_uuid();
    if reported != IMPLEMENTATION_SLOT {
        return Err(UpgradeRejection::NotProxiable {
            reported: format!("0x{}", hex::encode(reported)),
        });
    }

    check_append_only(current.layout(), incoming.layout()).map_err(UpgradeRejection::Layout)?;

    DispatchTable::with_proxy_entry_points(incoming.interface()).map_err(UpgradeRejection::SelectorCollision)
}
