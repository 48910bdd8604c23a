//! # Redis Sentinel Resolver
//!
//! Resolves a sentinel group name into connections to its current master
//! and to one of its replicas.

use crate::error::RedisStoreError;
use crate::store::RedisStore;
use async_trait::async_trait;
use pubkv_core::{Result, SentinelResolver, StoreClient};
use redis::sentinel::Sentinel;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct RedisSentinel {
    sentinel: Mutex<Sentinel>,
}

impl RedisSentinel {
    /// Sentinel over the given node urls, e.g. `redis://127.0.0.1:26379`.
    pub fn new<S: AsRef<str>>(urls: &[S]) -> Result<Self> {
        let urls: Vec<&str> = urls.iter().map(AsRef::as_ref).collect();
        let sentinel = Sentinel::build(urls).map_err(RedisStoreError::from)?;
        Ok(Self {
            sentinel: Mutex::new(sentinel),
        })
    }
}

impl std::fmt::Debug for RedisSentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSentinel").finish_non_exhaustive()
    }
}

#[async_trait]
impl SentinelResolver for RedisSentinel {
    async fn primary_for(&self, group: &str) -> Result<Arc<dyn StoreClient>> {
        let client = self
            .sentinel
            .lock()
            .await
            .async_master_for(group, None)
            .await
            .map_err(RedisStoreError::from)?;
        info!("Resolved master for sentinel group {}", group);
        Ok(Arc::new(RedisStore::from_client(client).await?))
    }

    async fn replica_for(&self, group: &str) -> Result<Arc<dyn StoreClient>> {
        let client = self
            .sentinel
            .lock()
            .await
            .async_replica_for(group, None)
            .await
            .map_err(RedisStoreError::from)?;
        info!("Resolved replica for sentinel group {}", group);
        Ok(Arc::new(RedisStore::from_client(client).await?))
    }
}
