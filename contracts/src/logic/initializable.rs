//! Tiered initializer guard.
//!
//! The `initialized` slot holds the highest tier whose initializer has run.
//! Tier `n` may run exactly once, only through a proxy, and only when the
//! marker reads `n - 1`. A bare logic instance has its marker set to
//! [`INITIALIZERS_DISABLED`] at construction, which no tier can pass.

use crate::config::INITIALIZERS_DISABLED;
use crate::error::VaultError;

use super::CallContext;

/// Fails unless tier `tier` may run now. Does not move the marker.
pub fn check_tier(ctx: &CallContext<'_>, marker: u8, tier: u8) -> Result<(), VaultError> {
    if marker == INITIALIZERS_DISABLED || marker >= tier {
        return Err(VaultError::AlreadyInitialized { tier });
    }
    if !ctx.delegated {
        return Err(VaultError::NotDelegated);
    }
    let required = tier.saturating_sub(1);
    if marker != required {
        return Err(VaultError::InitializerOutOfOrder {
            tier,
            required,
            found: marker,
        });
    }
    Ok(())
}

/// Records that tier `tier` has completed.
pub fn complete_tier(marker: &mut u8, tier: u8) {
    *marker = tier;
    tracing::info!(tier, "initializer completed");
}

/// Permanently blocks every initializer on this storage.
pub fn disable_initializers(marker: &mut u8) {
    *marker = INITIALIZERS_DISABLED;
}
