//! # Vault Configuration & Constants
//!
//! Every magic number in the vault lives here. Fee math, yield math, and
//! the upgrade interface all read from this module, so a value changed here
//! changes it everywhere.
//!
//! Several of these values are baked into persisted state semantics (the
//! basis-point denominator, the length of a year). Changing them after a
//! vault has been deployed silently rewrites what existing balances mean.

use crate::types::Revision;

// ---------------------------------------------------------------------------
// Basis Points
// ---------------------------------------------------------------------------

/// One whole, expressed in basis points. 10_000 bps = 100%.
pub const BASIS_POINTS_DENOMINATOR: u128 = 10_000;

/// Upper bound for any basis-point parameter (fees, yield rates).
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Deposit fee used by the operator tooling when none is given: 5.00%.
pub const DEFAULT_DEPOSIT_FEE_BPS: u16 = 500;

/// Annual yield rate used by the V2 upgrade when none is given: 5.00%.
pub const DEFAULT_YIELD_RATE_BPS: u16 = 500;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Length of a yield year. 365 days flat, no leap-year correction, so
/// accrual stays a pure function of elapsed seconds.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Withdrawal delay used by the V3 upgrade when none is given: 7 days.
pub const DEFAULT_WITHDRAWAL_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Upgrade Interface
// ---------------------------------------------------------------------------

/// Version string of the upgrade entry point exposed by every revision.
pub const UPGRADE_INTERFACE_VERSION: &str = "5.0.0";

/// Identifier of the storage slot that holds the active implementation.
///
/// Returned by `proxiableUUID()`; a revision that reports anything else is
/// not a compatible upgrade target.
pub const IMPLEMENTATION_SLOT: [u8; 32] = [
    0x36, 0x08, 0x94, 0xa1, 0x3b, 0xa1, 0xa3, 0x21, 0x06, 0x67, 0xc8, 0x28, 0x49, 0x2d, 0xb9, 0x8d,
    0xca, 0x3e, 0x20, 0x76, 0xcc, 0x37, 0x35, 0xa9, 0x20, 0xa3, 0xca, 0x50, 0x5d, 0x38, 0x2b, 0xbc,
];

/// Length in bytes of an operation dispatch selector.
pub const SELECTOR_LENGTH: usize = 4;

/// Marker written into a bare (non-proxied) logic instance's storage so that
/// none of its initializers can ever run.
pub const INITIALIZERS_DISABLED: u8 = u8::MAX;

/// The newest revision shipped in this crate.
pub const LATEST_REVISION: Revision = Revision::V3;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns `true` if `bps` is a valid basis-point value (`0..=10_000`).
pub fn is_valid_basis_points(bps: u16) -> bool {
    bps <= MAX_BASIS_POINTS
}

/// Hex rendering of [`IMPLEMENTATION_SLOT`], as reported by `proxiableUUID()`.
pub fn implementation_slot_hex() -> String {
    format!("0x{}", hex::encode(IMPLEMENTATION_SLOT))
}
