// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TokenVault Contracts
//!
//! An upgradeable custody vault for a single fungible asset. Users deposit
//! the asset (net of a basis-point fee) and withdraw their balance. The
//! vault lives behind a proxy whose logic can be replaced by newer
//! revisions without losing state:
//!
//! - **V1** - deposit/withdraw accounting, deposit fee, admin role.
//! - **V2** - adds simple annual yield on principal and pausable deposits.
//! - **V3** - adds two-phase withdrawals behind a delay, plus an emergency
//!   exit that bypasses it.
//!
//! ## Layout
//!
//! ```text
//! proxy/   - Proxy (storage owner, call pipeline), upgrade gate, typed client
//! logic/   - V1/V2/V3 revisions, initializer guard, selectors, events, math
//! storage/ - slot layout, VaultState, sled persistence
//! asset/   - ledger interface and an in-memory token
//! access   - admin role registry
//! clock    - system and manual clocks
//! config   - protocol constants
//! ```
//!
//! ## Design Principles
//!
//! 1. All monetary operations use checked arithmetic. Overflow is an error,
//!    never a wrap.
//! 2. Storage only ever grows. A revision may append slots, never reorder,
//!    retype, or drop them.
//! 3. Effects before interactions: balances are committed before the asset
//!    ledger is asked to move anything.
//! 4. Every failed call is rolled back in full.

pub mod access;
pub mod asset;
pub mod clock;
pub mod config;
pub mod error;
pub mod logic;
pub mod proxy;
pub mod storage;
pub mod types;

pub use access::{AccessError, Role, RoleRegistry, DEFAULT_ADMIN_ROLE};
pub use asset::{AssetLedger, AssetTransfer, LedgerError, MockToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::VaultError;
pub use logic::instance::BareInstance;
pub use logic::{builtin, CallOutput, Operation, VaultCall, VaultEvent, VaultLogic};
pub use proxy::{CallReceipt, Proxy, ProxyRecord, UpgradeRejection, VaultClient};
pub use storage::{VaultDb, VaultState, WithdrawalRequest};
pub use types::{Address, Amount, Revision};
