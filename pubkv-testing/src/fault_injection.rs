use async_trait::async_trait;
use bytes::Bytes;
use pubkv_core::{PubKvError, PubSubChannel, Result, StoreClient};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Store wrapper that fails every call while a fault is injected.
pub struct FaultyStore {
    inner: Arc<dyn StoreClient>,
    failing: AtomicBool,
    rejected: AtomicU64,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn StoreClient>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn inject_fault(&self) {
        warn!("Injecting store fault");
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    /// Number of calls rejected while faulty
    pub fn rejected_calls(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(PubKvError::store("Connection refused (injected fault)"));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn publish(&self, channel: &str, payload: Bytes) -> Result<usize> {
        self.check()?;
        self.inner.publish(channel, payload).await
    }

    async fn pubsub(&self) -> Result<Box<dyn PubSubChannel>> {
        self.check()?;
        self.inner.pubsub().await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.check()?;
        self.inner.keys().await
    }

    async fn flush_all(&self) -> Result<()> {
        self.check()?;
        self.inner.flush_all().await
    }
}
