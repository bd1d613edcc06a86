//! # VaultDb: Persistent Vault Storage
//!
//! Persists a deployed proxy, the asset ledger it custodies, and the event
//! log on sled. The operator CLI opens one of these per data directory;
//! tests use [`VaultDb::open_temporary`].
//!
//! ## Key Layout
//!
//! Everything lives in a single `vault` tree so that one `Batch` covers a
//! whole call:
//!
//! | Key                    | Value                  |
//! |------------------------|------------------------|
//! | `proxy`                | `bincode(ProxyRecord)` |
//! | `ledger`               | `bincode(MockToken)`   |
//! | `event_seq`            | next sequence (8B BE)  |
//! | `event/` + seq (8B BE) | `bincode(VaultEvent)`  |
//!
//! Event sequence numbers are big-endian so a prefix scan returns them in
//! emission order.

use sled::{Batch, Db, Tree};
use std::path::Path;

use crate::asset::MockToken;
use crate::logic::events::VaultEvent;
use crate::proxy::ProxyRecord;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

const KEY_PROXY: &[u8] = b"proxy";
const KEY_LEDGER: &[u8] = b"ledger";
const KEY_EVENT_SEQ: &[u8] = b"event_seq";
const EVENT_PREFIX: &[u8] = b"event/";

fn event_key(seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(EVENT_PREFIX.len() + 8);
    key.extend_from_slice(EVENT_PREFIX);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

fn encode<T: serde::Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// VaultDb
// ---------------------------------------------------------------------------

/// On-disk home of one vault deployment.
#[derive(Debug, Clone)]
pub struct VaultDb {
    db: Db,
    vault: Tree,
}

impl VaultDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let vault = db.open_tree("vault")?;
        Ok(Self { db, vault })
    }

    /// Whether a proxy has been deployed into this database.
    pub fn is_deployed(&self) -> DbResult<bool> {
        Ok(self.vault.contains_key(KEY_PROXY)?)
    }

    /// Persists the proxy, the ledger, and any new events in one batch.
    pub fn save(&self, record: &ProxyRecord, ledger: &MockToken, events: &[VaultEvent]) -> DbResult<()> {
        let mut batch = Batch::default();
        batch.insert(KEY_PROXY, encode(record)?);
        batch.insert(KEY_LEDGER, encode(ledger)?);

        let mut seq = self.next_event_seq()?;
        for event in events {
            batch.insert(event_key(seq), encode(event)?);
            seq += 1;
        }
        batch.insert(KEY_EVENT_SEQ, seq.to_be_bytes().to_vec());

        self.vault.apply_batch(batch)?;
        self.db.flush()?;

        tracing::debug!(
            implementation = %record.implementation,
            events = events.len(),
            "vault state persisted"
        );
        Ok(())
    }

    /// The persisted proxy, if one has been deployed.
    pub fn load_proxy(&self) -> DbResult<Option<ProxyRecord>> {
        match self.vault.get(KEY_PROXY)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// The persisted asset ledger, if one has been deployed.
    pub fn load_ledger(&self) -> DbResult<Option<MockToken>> {
        match self.vault.get(KEY_LEDGER)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads both halves of a deployment, failing if either is missing.
    pub fn load_deployment(&self) -> DbResult<(ProxyRecord, MockToken)> {
        let record = self
            .load_proxy()?
            .ok_or_else(|| DbError::NotFound("proxy".into()))?;
        let ledger = self
            .load_ledger()?
            .ok_or_else(|| DbError::NotFound("ledger".into()))?;
        Ok((record, ledger))
    }

    /// All persisted events, oldest first.
    pub fn events(&self) -> DbResult<Vec<VaultEvent>> {
        self.vault
            .scan_prefix(EVENT_PREFIX)
            .map(|entry| -> DbResult<VaultEvent> {
                let (_, bytes) = entry?;
                decode(&bytes)
            })
            .collect()
    }

    /// Number of events persisted so far.
    pub fn event_count(&self) -> DbResult<u64> {
        self.next_event_seq()
    }

    fn next_event_seq(&self) -> DbResult<u64> {
        match self.vault.get(KEY_EVENT_SEQ)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| DbError::Serialization("invalid event sequence bytes".into()))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::state::VaultState;
    use crate::types::{Address, Revision};

    fn sample_record() -> ProxyRecord {
        let mut state = VaultState::default();
        state.base.initialized = 1;
        state.base.asset = Some(Address::from("token"));
        state.base.deposit_fee_bps = 500;
        state.base.balances.insert(Address::from("alice"), 95);
        state.base.total_deposits = 95;
        ProxyRecord {
            address: Address::from("vault"),
            implementation: Revision::V1,
            state,
        }
    }

    #[test]
    fn empty_database_has_no_deployment() {
        let db = VaultDb::open_temporary().unwrap();
        assert!(!db.is_deployed().unwrap());
        assert!(db.load_proxy().unwrap().is_none());
        assert!(matches!(db.load_deployment(), Err(DbError::NotFound(_))));
    }

    #[test]
    fn save_and_reload_deployment() {
        let db = VaultDb::open_temporary().unwrap();
        let record = sample_record();
        let token = MockToken::with_address(Address::from("token"), "Mock", "MOCK", 18);

        db.save(&record, &token, &[]).unwrap();

        let (loaded, ledger) = db.load_deployment().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(ledger, token);
    }

    #[test]
    fn events_append_in_order() {
        let db = VaultDb::open_temporary().unwrap();
        let record = sample_record();
        let token = MockToken::with_address(Address::from("token"), "Mock", "MOCK", 18);

        db.save(&record, &token, &[VaultEvent::Initialized { tier: 1 }]).unwrap();
        db.save(
            &record,
            &token,
            &[
                VaultEvent::Withdrawn {
                    user: Address::from("alice"),
                    amount: 5,
                },
                VaultEvent::Initialized { tier: 2 },
            ],
        )
        .unwrap();

        let events = db.events().unwrap();
        assert_eq!(db.event_count().unwrap(), 3);
        assert_eq!(events[0], VaultEvent::Initialized { tier: 1 });
        assert_eq!(events[2], VaultEvent::Initialized { tier: 2 });
    }

    #[test]
    fn persistent_database_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let record = sample_record();
        let token = MockToken::with_address(Address::from("token"), "Mock", "MOCK", 18);
        {
            let db = VaultDb::open(dir.path()).unwrap();
            db.save(&record, &token, &[]).unwrap();
        }
        let db = VaultDb::open(dir.path()).unwrap();
        assert_eq!(db.load_proxy().unwrap(), Some(record));
    }
}
