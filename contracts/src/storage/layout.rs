//! # Storage Layout Contract
//!
//! The vault's persistent record is a fixed sequence of named, typed slots.
//! Revisions only ever append: V2 adds its slots after all of V1's, V3 after
//! all of V2's. A slot, once published at an index, keeps its name and type
//! for the lifetime of every deployed proxy.
//!
//! ```text
//! index  name                    kind          since
//! 0      initialized             uint8         V1
//! 1      asset                   address       V1
//! 2      roles                   roles         V1
//! 3      deposit_fee_bps         uint16        V1
//! 4      balances                balance-map   V1
//! 5      total_deposits          uint128       V1
//! 6      yield_rate_bps          uint16        V2
//! 7      deposits_paused         bool          V2
//! 8      deposit_timestamps      time-map      V2
//! 9      yield_activated_at      timestamp     V2
//! 10     withdrawal_delay_secs   uint64        V3
//! 11     withdrawal_requests     request-map   V3
//! ```
//!
//! [`check_append_only`] is what the upgrade gate runs before it lets a new
//! revision take over a proxy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Revision;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Ways an incoming layout can be incompatible with the current one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The incoming layout drops slots the current one has.
    #[error("layout truncated: current layout has {current} slots, incoming has {incoming}")]
    Truncated {
        /// Slots in the current layout.
        current: usize,
        /// Slots in the incoming layout.
        incoming: usize,
    },

    /// A slot was renamed, retyped, or reordered.
    #[error("slot {index} mismatch: expected {expected}, found {found}")]
    SlotMismatch {
        /// Position of the offending slot.
        index: u16,
        /// Descriptor currently at that position.
        expected: String,
        /// Descriptor the incoming revision declares there.
        found: String,
    },

    /// Slot indices are not a dense `0..n` sequence.
    #[error("slot at position {position} declares index {index}")]
    NonContiguous {
        /// Position in the declared list.
        position: usize,
        /// Index the slot claims.
        index: u16,
    },
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Value type stored in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    Uint8,
    Uint16,
    Uint64,
    Uint128,
    Bool,
    Address,
    Roles,
    Timestamp,
    /// `address => uint128`
    BalanceMap,
    /// `address => timestamp`
    TimestampMap,
    /// `address => {amount, requestedAt}`
    RequestMap,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotKind::Uint8 => "uint8",
            SlotKind::Uint16 => "uint16",
            SlotKind::Uint64 => "uint64",
            SlotKind::Uint128 => "uint128",
            SlotKind::Bool => "bool",
            SlotKind::Address => "address",
            SlotKind::Roles => "roles",
            SlotKind::Timestamp => "timestamp",
            SlotKind::BalanceMap => "mapping(address=>uint128)",
            SlotKind::TimestampMap => "mapping(address=>timestamp)",
            SlotKind::RequestMap => "mapping(address=>request)",
        };
        f.write_str(s)
    }
}

/// One slot of the persistent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub index: u16,
    pub name: &'static str,
    pub kind: SlotKind,
    pub introduced_in: Revision,
}

impl SlotDescriptor {
    pub const fn new(index: u16, name: &'static str, kind: SlotKind, introduced_in: Revision) -> Self {
        Self {
            index,
            name,
            kind,
            introduced_in,
        }
    }

    /// Name and kind agree. `introduced_in` is bookkeeping and not compared.
    fn is_compatible_with(&self, other: &SlotDescriptor) -> bool {
        self.index == other.index && self.name == other.name && self.kind == other.kind
    }
}

impl fmt::Display for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// The full append-only layout, oldest slots first.
pub const STORAGE_LAYOUT: &[SlotDescriptor] = &[
    SlotDescriptor::new(0, "initialized", SlotKind::Uint8, Revision::V1),
    SlotDescriptor::new(1, "asset", SlotKind::Address, Revision::V1),
    SlotDescriptor::new(2, "roles", SlotKind::Roles, Revision::V1),
    SlotDescriptor::new(3, "deposit_fee_bps", SlotKind::Uint16, Revision::V1),
    SlotDescriptor::new(4, "balances", SlotKind::BalanceMap, Revision::V1),
    SlotDescriptor::new(5, "total_deposits", SlotKind::Uint128, Revision::V1),
    SlotDescriptor::new(6, "yield_rate_bps", SlotKind::Uint16, Revision::V2),
    SlotDescriptor::new(7, "deposits_paused", SlotKind::Bool, Revision::V2),
    SlotDescriptor::new(8, "deposit_timestamps", SlotKind::TimestampMap, Revision::V2),
    SlotDescriptor::new(9, "yield_activated_at", SlotKind::Timestamp, Revision::V2),
    SlotDescriptor::new(10, "withdrawal_delay_secs", SlotKind::Uint64, Revision::V3),
    SlotDescriptor::new(11, "withdrawal_requests", SlotKind::RequestMap, Revision::V3),
];

/// The prefix of [`STORAGE_LAYOUT`] a revision reads and writes.
pub fn layout_for(revision: Revision) -> &'static [SlotDescriptor] {
    let end = STORAGE_LAYOUT
        .iter()
        .take_while(|slot| slot.introduced_in <= revision)
        .count();
    &STORAGE_LAYOUT[..end]
}

/// Verifies that `incoming` keeps every slot of `current` at the same index,
/// with the same name and type, and only appends after them.
pub fn check_append_only(current: &[SlotDescriptor], incoming: &[SlotDescriptor]) -> Result<(), LayoutError> {
    for (position, slot) in incoming.iter().enumerate() {
        if slot.index as usize != position {
            return Err(LayoutError::NonContiguous {
                position,
                index: slot.index,
            });
        }
    }

    if incoming.len() < current.len() {
        return Err(LayoutError::Truncated {
            current: current.len(),
            incoming: incoming.len(),
        });
    }

    for (existing, proposed) in current.iter().zip(incoming) {
        if !existing.is_compatible_with(proposed) {
            return Err(LayoutError::SlotMismatch {
                index: existing.index,
                expected: existing.to_string(),
                found: proposed.to_string(),
            });
        }
    }

    Ok(())
}
