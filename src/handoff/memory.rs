//! Process-local key-value store, used for session-scoped slots.
//!
//! Entries expire through [`KvStore::evict_older_than`]; the flow sweeper
//! calls it periodically.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::KvStore;
use crate::error::StoreError;

struct Entry {
    value: String,
    written_at: Instant,
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, owner: &str, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(owner.to_string(), key.to_string()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, owner: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            (owner.to_string(), key.to_string()),
            Entry {
                value: value.to_string(),
                written_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, owner: &str, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(&(owner.to_string(), key.to_string()))
            .is_some())
    }

    async fn evict_older_than(&self, max_age: Duration) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.written_at) <= max_age);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "Expired session slots");
        }
        Ok(evicted)
    }
}
