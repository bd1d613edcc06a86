//! # Access Control
//!
//! A role registry holding the vault's single administrative role. Every
//! privileged operation calls [`RoleRegistry::require_role`] before it reads
//! or writes anything else, and gets back a typed result.
//!
//! The admin role is assigned once at tier-1 initialization and can only
//! ever be moved, never removed: [`RoleRegistry::transfer_admin`] replaces
//! the holder in a single assignment, so there is no point at which two
//! principals (or none) hold it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller does not hold the role the operation requires.
    #[error("unauthorized: {account} is missing role {role}")]
    MissingRole {
        /// The caller.
        account: Address,
        /// The role it needed.
        role: Role,
    },

    /// Role was already assigned; the registry only seeds it once.
    #[error("role {0} is already assigned")]
    AlreadyAssigned(Role),

    /// Admin transfer to the principal that already holds the role.
    #[error("{0} already holds the admin role")]
    SameAdmin(Address),
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Roles known to the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Fee, yield, pause, delay, admin transfer, and upgrade authority.
    DefaultAdmin,
}

impl Role {
    /// 32-byte role identifier. The default admin role is all zeroes.
    pub fn id(self) -> [u8; 32] {
        match self {
            Role::DefaultAdmin => [0u8; 32],
        }
    }

    /// Resolves a role identifier back to a role.
    pub fn from_id(id: &[u8; 32]) -> Option<Self> {
        if *id == Role::DefaultAdmin.id() {
            Some(Role::DefaultAdmin)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::DefaultAdmin => write!(f, "DEFAULT_ADMIN_ROLE"),
        }
    }
}

/// Identifier of the default admin role.
pub const DEFAULT_ADMIN_ROLE: [u8; 32] = [0u8; 32];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Persistent role assignments. Lives in the V1 storage group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    admin: Option<Address>,
}

impl RoleRegistry {
    /// Returns `true` if `account` holds `role`.
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        match role {
            Role::DefaultAdmin => self.admin.as_ref() == Some(account),
        }
    }

    /// Fails with [`AccessError::MissingRole`] unless `account` holds `role`.
    pub fn require_role(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            tracing::warn!(account = %account, role = %role, "role check failed");
            Err(AccessError::MissingRole {
                account: account.clone(),
                role,
            })
        }
    }

    /// Current admin, if the registry has been seeded.
    pub fn admin(&self) -> Option<&Address> {
        self.admin.as_ref()
    }

    /// Seeds the admin role. Only the tier-1 initializer calls this.
    pub fn grant_initial_admin(&mut self, admin: Address) -> Result<(), AccessError> {
        if self.admin.is_some() {
            return Err(AccessError::AlreadyAssigned(Role::DefaultAdmin));
        }
        self.admin = Some(admin);
        Ok(())
    }

    /// Moves the admin role from `caller` to `new_admin` in one assignment.
    /// Returns the previous holder.
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> Result<Address, AccessError> {
        self.require_role(Role::DefaultAdmin, caller)?;
        if &new_admin == caller {
            return Err(AccessError::SameAdmin(new_admin));
        }
        let previous = self.admin.replace(new_admin);
        Ok(previous.unwrap_or_else(|| caller.clone()))
    }
}
