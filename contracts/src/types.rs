//! Core value types shared by every module: principals, amounts, and the
//! logic revision tags.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asset amounts in the ledger's smallest unit.
///
/// `u128` leaves headroom for 18-decimal assets; every arithmetic step on an
/// `Amount` goes through `checked_*`.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An opaque principal identifier: a user, an admin, the vault itself, or an
/// asset ledger.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, unique address with a readable prefix,
    /// e.g. `vault-6f1c...`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// The logic revisions a vault proxy can point at.
///
/// Each revision is a strict extension of the one before it: V2 adds yield,
/// V3 adds delayed withdrawals. The discriminant doubles as the
/// initialization tier the revision introduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Revision {
    /// Base deposit/withdraw accounting.
    V1 = 1,
    /// Adds yield accrual and pausable deposits.
    V2 = 2,
    /// Adds two-phase and emergency withdrawals.
    V3 = 3,
}

impl Revision {
    /// All revisions, oldest first.
    pub const ALL: [Revision; 3] = [Revision::V1, Revision::V2, Revision::V3];

    /// The tag reported by `getImplementationVersion()`.
    pub fn tag(self) -> &'static str {
        match self {
            Revision::V1 => "V1",
            Revision::V2 => "V2",
            Revision::V3 => "V3",
        }
    }

    /// The initialization tier this revision introduces.
    pub fn tier(self) -> u8 {
        self as u8
    }

    /// Parses a tag such as `"v2"` or `"V2"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "V1" => Some(Revision::V1),
            "V2" => Some(Revision::V2),
            "V3" => Some(Revision::V3),
            _ => None,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_addresses_are_unique_and_prefixed() {
        let a = Address::generate("user");
        let b = Address::generate("user");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("user-"));
    }

    #[test]
    fn address_serializes_as_plain_string() {
        let json = serde_json::to_string(&Address::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn revision_tags_round_trip() {
        for rev in Revision::ALL {
            assert_eq!(Revision::from_tag(rev.tag()), Some(rev));
        }
        assert_eq!(Revision::from_tag("v2"), Some(Revision::V2));
        assert_eq!(Revision::from_tag("V4"), None);
    }

    #[test]
    fn revision_tiers_are_ordered() {
        assert_eq!(Revision::V1.tier(), 1);
        assert_eq!(Revision::V3.tier(), 3);
        assert!(Revision::V1 < Revision::V2);
    }
}
