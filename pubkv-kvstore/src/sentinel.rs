//! In-memory sentinel: named groups resolving to primary and replica views.

use crate::operations::MemoryStoreError;
use crate::store::MemoryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use pubkv_core::{Result, SentinelResolver, StoreClient};
use std::sync::Arc;
use tracing::debug;

/// Resolves group names to [`MemoryStore`] primary/replica pairs.
#[derive(Default)]
pub struct MemorySentinel {
    groups: DashMap<String, MemoryStore>,
}

impl MemorySentinel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` as the primary of `group`
    pub fn add_group(&self, group: impl Into<String>, store: MemoryStore) {
        self.groups.insert(group.into(), store);
    }

    fn lookup(&self, group: &str) -> std::result::Result<MemoryStore, MemoryStoreError> {
        self.groups
            .get(group)
            .map(|store| store.clone())
            .ok_or_else(|| MemoryStoreError::UnknownGroup(group.to_string()))
    }
}

#[async_trait]
impl SentinelResolver for MemorySentinel {
    async fn primary_for(&self, group: &str) -> Result<Arc<dyn StoreClient>> {
        let store = self.lookup(group)?;
        debug!("Resolved primary for group {}", group);
        Ok(Arc::new(store))
    }

    async fn replica_for(&self, group: &str) -> Result<Arc<dyn StoreClient>> {
        let store = self.lookup(group)?;
        debug!("Resolved replica for group {}", group);
        Ok(Arc::new(store.replica()))
    }
}
