//! # Storage Module
//!
//! The vault's persistent record and where it lives.
//!
//! ```text
//! layout.rs - slot descriptors and the append-only compatibility check
//! state.rs  - VaultState: the record itself, grouped by revision
//! db.rs     - sled persistence for a deployed proxy, its ledger and events
//! ```
//!
//! The record is owned by the proxy, never by a logic revision. Revisions
//! borrow it for the duration of a single call.

pub mod db;
pub mod layout;
pub mod state;

pub use db::{DbError, DbResult, VaultDb};
pub use layout::{check_append_only, layout_for, LayoutError, SlotDescriptor, SlotKind, STORAGE_LAYOUT};
pub use state::{AccrualSlots, BaseSlots, InvariantViolation, VaultState, WithdrawalRequest, WithdrawalSlots};
