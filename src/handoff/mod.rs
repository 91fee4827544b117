//! Context handoff store: scoped key-value slots that carry a finished
//! flow's record to the flow that follows it.
//!
//! Producers write a slot once when they exit; consumers read it on mount.
//! Reads are best-effort: absent or malformed content is logged and treated
//! as absent, never surfaced as an error.

pub mod libsql_store;
pub mod memory;
pub mod migrations;
pub mod slots;

pub use libsql_store::LibSqlStore;
pub use memory::MemoryStore;
pub use slots::{Scope, Slot};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::wizard::submission::iso_timestamp;

/// Raw storage for one scope. Values are JSON text.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, owner: &str, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, owner: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Returns whether an entry was removed.
    async fn remove(&self, owner: &str, key: &str) -> Result<bool, StoreError>;

    /// Drop entries not written for `max_age` and return how many went.
    /// Stores without expiry keep everything.
    async fn evict_older_than(&self, _max_age: Duration) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// A flow record stamped with when and where it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff<T> {
    #[serde(flatten)]
    pub record: T,
    pub timestamp: String,
    pub source: String,
}

impl<T> Handoff<T> {
    pub fn new(record: T, source: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            record,
            timestamp: iso_timestamp(at),
            source: source.into(),
        }
    }
}

/// Slot-level access over one store per scope. `owner` identifies the
/// visitor whose slots are addressed.
#[derive(Clone)]
pub struct HandoffStore {
    session: Arc<dyn KvStore>,
    durable: Arc<dyn KvStore>,
    /// Serializes list appends, which read and write in two steps.
    append_lock: Arc<Mutex<()>>,
}

impl HandoffStore {
    pub fn new(session: Arc<dyn KvStore>, durable: Arc<dyn KvStore>) -> Self {
        Self {
            session,
            durable,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Both scopes in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    fn backend(&self, slot: Slot) -> &dyn KvStore {
        match slot.scope() {
            Scope::Session => self.session.as_ref(),
            Scope::Durable => self.durable.as_ref(),
        }
    }

    /// Serialize `value` into `slot`, replacing any previous content.
    pub async fn write<T: Serialize>(
        &self,
        owner: &str,
        slot: Slot,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StoreError::Serialization(format!("{slot}: {e}")))?;
        self.backend(slot).set(owner, slot.key(), &json).await?;
        debug!(owner, slot = %slot, "Handoff written");
        Ok(())
    }

    /// Read and decode `slot`.
    pub async fn read<T: DeserializeOwned>(&self, owner: &str, slot: Slot) -> Option<T> {
        let raw = match self.backend(slot).get(owner, slot.key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(owner, slot = %slot, error = %e, "Failed to read handoff slot");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(owner, slot = %slot, error = %e, "Ignoring malformed handoff content");
                None
            }
        }
    }

    pub async fn remove(&self, owner: &str, slot: Slot) -> Result<bool, StoreError> {
        self.backend(slot).remove(owner, slot.key()).await
    }

    /// Append `entry` to the list held in `slot`. Malformed list content is
    /// replaced by a fresh list.
    pub async fn append<T: Serialize>(
        &self,
        owner: &str,
        slot: Slot,
        entry: &T,
    ) -> Result<usize, StoreError> {
        let entry = serde_json::to_value(entry)
            .map_err(|e| StoreError::Serialization(format!("{slot}: {e}")))?;
        let _guard = self.append_lock.lock().await;
        let mut entries = self.read_list(owner, slot).await;
        entries.push(entry);
        self.write(owner, slot, &entries).await?;
        Ok(entries.len())
    }

    /// Expire session-scoped slots not written for `max_age`. Durable slots
    /// are never expired.
    pub async fn evict_session(&self, max_age: Duration) -> Result<usize, StoreError> {
        self.session.evict_older_than(max_age).await
    }

    /// Entries of a list slot; empty when absent or malformed.
    pub async fn read_list(&self, owner: &str, slot: Slot) -> Vec<Value> {
        self.read::<Vec<Value>>(owner, slot)
            .await
            .unwrap_or_default()
    }
}
