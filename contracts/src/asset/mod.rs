//! # Asset Module: The Ledger the Vault Custodies
//!
//! The vault never holds asset bytes. It records entitlements and asks an
//! external ledger to move the real balances.
//!
//! ```text
//! ledger.rs - AssetLedger: the pull/push/balance interface the vault needs
//! token.rs  - MockToken: an in-memory ERC-20-style ledger for tests and tooling
//! ```

pub mod ledger;
pub mod token;

pub use ledger::{AssetLedger, AssetTransfer, LedgerError};
pub use token::MockToken;
