//! # Publish/Subscribe Bus
//!
//! Channel-addressed message bus behind the in-memory store. Every pub/sub
//! connection gets its own queue; publishing fans a frame out to each
//! connection subscribed to the channel.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use pubkv_core::{Frame, PubKvError, PubSubChannel, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Unique identifier for a pub/sub connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the pub/sub bus
#[derive(Debug, Clone, Default)]
pub struct BusStats {
    pub total_messages_published: u64,
    pub total_deliveries: u64,
    pub total_connections: usize,
    pub dropped_messages: u64,
}

type SubscriberMap = HashMap<SubscriptionId, (HashSet<String>, mpsc::UnboundedSender<Frame>)>;

/// Message bus distributing published payloads to subscribed connections
pub struct PubSubBus {
    subscribers: RwLock<SubscriberMap>,
    stats: RwLock<BusStats>,
}

impl PubSubBus {
    /// Create a new bus with no connections
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            stats: RwLock::new(BusStats::default()),
        }
    }

    /// Open a new pub/sub connection on this bus
    pub fn connect(self: &Arc<Self>) -> MemoryPubSub {
        let id = SubscriptionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        self.subscribers.write().insert(id, (HashSet::new(), tx));
        debug!("Pub/sub connection opened: {:?}", id);

        MemoryPubSub {
            id,
            bus: Arc::clone(self),
            receiver: rx,
        }
    }

    /// Add `channel` to a connection's subscriptions and acknowledge it.
    ///
    /// Returns false if the connection has been closed.
    fn subscribe(&self, id: SubscriptionId, channel: &str) -> bool {
        let mut subscribers = self.subscribers.write();
        match subscribers.get_mut(&id) {
            Some((channels, sender)) => {
                channels.insert(channel.to_string());
                sender.send(Frame::subscribed(channel)).is_ok()
            }
            None => false,
        }
    }

    fn disconnect(&self, id: SubscriptionId) {
        if self.subscribers.write().remove(&id).is_some() {
            debug!("Pub/sub connection closed: {:?}", id);
        }
    }

    /// Publish a payload to every connection subscribed to `channel`.
    ///
    /// Returns the number of connections the frame was delivered to.
    pub fn publish(&self, channel: &str, payload: Bytes) -> usize {
        let subscribers = self.subscribers.read();
        let mut delivered = 0;
        let mut dropped = 0;

        for (channels, sender) in subscribers.values() {
            if !channels.contains(channel) {
                continue;
            }
            if sender.send(Frame::message(channel, payload.clone())).is_ok() {
                delivered += 1;
            } else {
                // Receiver gone, cleaned up on disconnect
                dropped += 1;
            }
        }
        drop(subscribers);

        let mut stats = self.stats.write();
        stats.total_messages_published += 1;
        stats.total_deliveries += delivered as u64;
        stats.dropped_messages += dropped;

        debug!(
            "Published on channel={}: delivered={}, dropped={}",
            channel, delivered, dropped
        );
        delivered
    }

    /// Close every connection. Pending receivers observe end of stream.
    pub fn close_all(&self) {
        let mut subscribers = self.subscribers.write();
        let closed = subscribers.len();
        subscribers.clear();
        if closed > 0 {
            debug!("Closed {} pub/sub connections", closed);
        }
    }

    /// Number of open connections subscribed to `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers
            .read()
            .values()
            .filter(|(channels, _)| channels.contains(channel))
            .count()
    }

    /// Get current statistics
    pub fn get_stats(&self) -> BusStats {
        let mut stats = self.stats.read().clone();
        stats.total_connections = self.subscribers.read().len();
        stats
    }
}

impl Default for PubSubBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One pub/sub connection to a [`PubSubBus`]
pub struct MemoryPubSub {
    id: SubscriptionId,
    bus: Arc<PubSubBus>,
    receiver: mpsc::UnboundedReceiver<Frame>,
}

impl MemoryPubSub {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

#[async_trait]
impl PubSubChannel for MemoryPubSub {
    async fn subscribe(&mut self, channel: &str) -> Result<()> {
        if !self.bus.subscribe(self.id, channel) {
            return Err(PubKvError::subscription(
                channel,
                "pub/sub connection is closed",
            ));
        }
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.receiver.recv().await)
    }
}

impl Drop for MemoryPubSub {
    fn drop(&mut self) {
        self.bus.disconnect(self.id);
    }
}
