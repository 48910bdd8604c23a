//! # Store Client Capability
//!
//! The minimal operation set pubkv consumes from a backing store. Wire
//! protocol, pooling and failover belong to the implementations.

use crate::{Frame, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Request/response operations against one logical store connection.
///
/// Implementations must be safe to call concurrently from many handlers;
/// each call is one independent round trip.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Read the value stored at `key`.
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` if the key exists
    /// * `Ok(None)` if the key is missing
    /// * `Err(PubKvError::Store)` if the store could not serve the request
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `value` at `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Publish `payload` on `channel`. Returns the number of receivers.
    async fn publish(&self, channel: &str, payload: Bytes) -> Result<usize>;

    /// Open a fresh pub/sub channel with no subscriptions.
    async fn pubsub(&self) -> Result<Box<dyn PubSubChannel>>;

    /// Remove `key`. Returns true if a value was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// List every key in this connection's namespace.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key.
    async fn flush_all(&self) -> Result<()>;
}

/// A dedicated pub/sub connection.
#[async_trait]
pub trait PubSubChannel: Send {
    /// Subscribe to `channel`. Returns once the store has acknowledged it.
    async fn subscribe(&mut self, channel: &str) -> Result<()>;

    /// Wait for the next frame.
    ///
    /// Returns `Ok(None)` when the channel has been closed by the store.
    /// Must be cancel safe: dropping the future loses no frames.
    async fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Resolves a named high-availability group to its primary and replica.
#[async_trait]
pub trait SentinelResolver: Send + Sync {
    /// Connection to the current primary of `group`.
    async fn primary_for(&self, group: &str) -> Result<Arc<dyn StoreClient>>;

    /// Connection to a replica of `group`.
    async fn replica_for(&self, group: &str) -> Result<Arc<dyn StoreClient>>;
}

/// What an endpoint is built from.
#[derive(Clone)]
pub enum StoreTarget {
    /// One connection serves reads and writes
    Simple(Arc<dyn StoreClient>),
    /// Primary and replica are resolved through a sentinel group
    HighAvailability(Arc<dyn SentinelResolver>),
}

impl StoreTarget {
    pub fn is_high_availability(&self) -> bool {
        matches!(self, StoreTarget::HighAvailability(_))
    }
}

impl std::fmt::Debug for StoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreTarget::Simple(_) => write!(f, "StoreTarget::Simple"),
            StoreTarget::HighAvailability(_) => write!(f, "StoreTarget::HighAvailability"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PubKvError;
    use tokio_test::assert_err;

    struct EmptySentinel;

    #[async_trait]
    impl SentinelResolver for EmptySentinel {
        async fn primary_for(&self, group: &str) -> Result<Arc<dyn StoreClient>> {
            Err(PubKvError::store(format!("No master found for group '{}'", group)))
        }

        async fn replica_for(&self, group: &str) -> Result<Arc<dyn StoreClient>> {
            Err(PubKvError::store(format!("No replica found for group '{}'", group)))
        }
    }

    #[tokio::test]
    async fn test_high_availability_target() {
        let target = StoreTarget::HighAvailability(Arc::new(EmptySentinel));
        assert!(target.is_high_availability());
        assert_eq!(format!("{:?}", target), "StoreTarget::HighAvailability");

        let StoreTarget::HighAvailability(resolver) = target else {
            unreachable!();
        };
        let error = assert_err!(resolver.primary_for("mymaster").await.map(|_| ()));
        assert!(error.is_retryable());
        assert_err!(resolver.replica_for("mymaster").await.map(|_| ()));
    }
}
