//! # In-Memory Store
//!
//! Key-value store with publish/subscribe living entirely in process memory.
//! Implements [`StoreClient`] so handlers can run against it without a
//! server, and hands out read-only replica views for high-availability setups.

use crate::notifications::PubSubBus;
use crate::operations::MemoryStoreError;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use pubkv_core::{PubSubChannel, Result, StoreClient};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Maximum number of keys to store
    pub max_keys: usize,
    /// Maximum value size in bytes
    pub max_value_size: usize,
    /// Maximum key length in bytes
    pub max_key_len: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_keys: 1_000_000,
            max_value_size: 512 * 1024 * 1024, // 512MB, the usual Redis string limit
            max_key_len: 1024,
        }
    }
}

impl MemoryStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    pub fn with_max_value_size(mut self, size: usize) -> Self {
        self.max_value_size = size;
        self
    }
}

/// Value entry in the store with metadata
#[derive(Debug, Clone)]
pub struct ValueEntry {
    pub value: Bytes,
    pub version: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

impl ValueEntry {
    pub fn new(value: Bytes) -> Self {
        let now = now_millis();
        Self {
            value,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(&mut self, new_value: Bytes) {
        self.value = new_value;
        self.version += 1;
        self.updated_at = now_millis();
    }
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_keys: usize,
    pub total_operations: u64,
    pub memory_usage_bytes: usize,
}

/// Whether a store view accepts writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Primary,
    Replica,
}

struct Shared {
    config: MemoryStoreConfig,
    data: DashMap<String, ValueEntry>,
    bus: Arc<PubSubBus>,
    operations: AtomicU64,
}

/// In-memory key-value store with publish/subscribe.
///
/// Cloning yields another handle to the same keyspace. [`MemoryStore::replica`]
/// yields a read-only view that sees every write made through the primary.
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    role: StoreRole,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new(config: MemoryStoreConfig) -> Self {
        info!("In-memory store initialized with config: {:?}", config);
        Self {
            shared: Arc::new(Shared {
                config,
                data: DashMap::new(),
                bus: Arc::new(PubSubBus::new()),
                operations: AtomicU64::new(0),
            }),
            role: StoreRole::Primary,
        }
    }

    /// A read-only view over the same keyspace and bus
    pub fn replica(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            role: StoreRole::Replica,
        }
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    /// Get a value with metadata
    pub fn get_with_metadata(&self, key: &str) -> Option<ValueEntry> {
        self.record_operation();
        self.shared.data.get(key).map(|entry| entry.clone())
    }

    /// Get the number of keys in the store
    pub fn size(&self) -> usize {
        self.shared.data.len()
    }

    /// The pub/sub bus shared by every view of this store
    pub fn bus(&self) -> Arc<PubSubBus> {
        Arc::clone(&self.shared.bus)
    }

    /// Close every pub/sub connection, as a server restart would
    pub fn close_pubsub(&self) {
        info!("Closing all pub/sub connections");
        self.shared.bus.close_all();
    }

    /// Get store statistics
    pub fn get_stats(&self) -> StoreStats {
        StoreStats {
            total_keys: self.shared.data.len(),
            total_operations: self.shared.operations.load(Ordering::Acquire),
            memory_usage_bytes: self.estimate_memory_usage(),
        }
    }

    // Private helper methods

    fn validate_key(&self, key: &str) -> std::result::Result<(), MemoryStoreError> {
        if key.is_empty() {
            return Err(MemoryStoreError::InvalidKey(
                "Key cannot be empty".to_string(),
            ));
        }
        if key.len() > self.shared.config.max_key_len {
            return Err(MemoryStoreError::InvalidKey("Key too long".to_string()));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> std::result::Result<(), MemoryStoreError> {
        match self.role {
            StoreRole::Primary => Ok(()),
            StoreRole::Replica => Err(MemoryStoreError::ReadOnly),
        }
    }

    fn record_operation(&self) {
        self.shared.operations.fetch_add(1, Ordering::AcqRel);
    }

    fn estimate_memory_usage(&self) -> usize {
        self.shared
            .data
            .iter()
            .map(|entry| entry.key().len() + entry.value().value.len())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryStoreConfig::default())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("role", &self.role)
            .field("keys", &self.shared.data.len())
            .finish()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.validate_key(key)?;
        self.record_operation();

        let result = self.shared.data.get(key).map(|entry| entry.value.clone());
        debug!("GET operation: key={}, found={}", key, result.is_some());
        Ok(result)
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.ensure_writable()?;
        self.validate_key(key)?;
        if value.len() > self.shared.config.max_value_size {
            return Err(MemoryStoreError::ValueTooLarge {
                size: value.len(),
                max: self.shared.config.max_value_size,
            }
            .into());
        }

        let value_len = value.len();
        if let Some(mut entry) = self.shared.data.get_mut(key) {
            entry.update(value);
        } else {
            if self.shared.data.len() >= self.shared.config.max_keys {
                return Err(MemoryStoreError::StoreFull.into());
            }
            self.shared
                .data
                .insert(key.to_string(), ValueEntry::new(value));
        }
        self.record_operation();

        debug!("SET operation: key={}, value_len={}", key, value_len);
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Bytes) -> Result<usize> {
        self.record_operation();
        Ok(self.shared.bus.publish(channel, payload))
    }

    async fn pubsub(&self) -> Result<Box<dyn PubSubChannel>> {
        Ok(Box::new(self.shared.bus.connect()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_writable()?;
        self.validate_key(key)?;
        self.record_operation();

        let existed = self.shared.data.remove(key).is_some();
        debug!("DELETE operation: key={}, existed={}", key, existed);
        Ok(existed)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.record_operation();
        let keys: Vec<String> = self
            .shared
            .data
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        debug!("KEYS operation: count={}", keys.len());
        Ok(keys)
    }

    async fn flush_all(&self) -> Result<()> {
        self.ensure_writable()?;
        let old_size = self.shared.data.len();
        self.shared.data.clear();
        self.record_operation();

        info!("FLUSHALL operation: removed {} keys", old_size);
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
