//! # Redis Store
//!
//! [`StoreClient`] over a multiplexed Redis connection. Every handler call
//! is one command on a clone of the shared connection.

use crate::error::RedisStoreError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use pubkv_core::{Frame, PubSubChannel, Result, StoreClient};
use redis::aio::{MultiplexedConnection, PubSub};
use redis::{AsyncCommands, Client, Msg};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Redis connection used for key-value commands and publishing.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to the server at `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn open(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(RedisStoreError::from)?;
        Self::from_client(client).await
    }

    pub async fn from_client(client: Client) -> Result<Self> {
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(RedisStoreError::from)?;
        info!("Connected to redis at {}", client.get_connection_info().addr);
        Ok(Self { client, connection })
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr.to_string())
            .finish()
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut con = self.connection();
        let value: Option<Vec<u8>> = con.get(key).await.map_err(RedisStoreError::from)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let mut con = self.connection();
        con.set::<_, _, ()>(key, value.to_vec())
            .await
            .map_err(RedisStoreError::from)?;
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Bytes) -> Result<usize> {
        let mut con = self.connection();
        let receivers: usize = con
            .publish(channel, payload.to_vec())
            .await
            .map_err(RedisStoreError::from)?;
        Ok(receivers)
    }

    async fn pubsub(&self) -> Result<Box<dyn PubSubChannel>> {
        let pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(RedisStoreError::from)?;
        debug!("Opened redis pub/sub connection");
        Ok(Box::new(RedisPubSub::new(pubsub)))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut con = self.connection();
        let removed: usize = con.del(key).await.map_err(RedisStoreError::from)?;
        Ok(removed > 0)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut con = self.connection();
        let keys: Vec<Vec<u8>> = con.keys("*").await.map_err(RedisStoreError::from)?;
        Ok(keys
            .iter()
            .map(|key| String::from_utf8_lossy(key).into_owned())
            .collect())
    }

    async fn flush_all(&self) -> Result<()> {
        let mut con = self.connection();
        redis::cmd("FLUSHALL")
            .query_async::<_, ()>(&mut con)
            .await
            .map_err(RedisStoreError::from)?;
        info!("Flushed all redis keys");
        Ok(())
    }
}

enum ChannelState {
    Subscribing(PubSub),
    Streaming(BoxStream<'static, Msg>),
}

/// Dedicated Redis pub/sub connection.
///
/// Subscriptions are accepted until `next_frame` first has to wait for a
/// message; after that the connection is switched into message streaming.
/// Before any subscription `next_frame` stays pending. Redis confirms
/// subscriptions internally, so an acknowledgement frame is queued locally
/// for each one.
pub struct RedisPubSub {
    state: Option<ChannelState>,
    pending: VecDeque<Frame>,
    subscriptions: usize,
}

impl RedisPubSub {
    fn new(pubsub: PubSub) -> Self {
        Self {
            state: Some(ChannelState::Subscribing(pubsub)),
            pending: VecDeque::new(),
            subscriptions: 0,
        }
    }
}

#[async_trait]
impl PubSubChannel for RedisPubSub {
    async fn subscribe(&mut self, channel: &str) -> Result<()> {
        match self.state.as_mut() {
            Some(ChannelState::Subscribing(pubsub)) => {
                pubsub
                    .subscribe(channel)
                    .await
                    .map_err(RedisStoreError::from)?;
                self.pending.push_back(Frame::subscribed(channel));
                self.subscriptions += 1;
                debug!("Subscribed redis connection to {}", channel);
                Ok(())
            }
            _ => Err(RedisStoreError::SubscribeWhileStreaming(channel.to_string()).into()),
        }
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(Some(frame));
        }

        if let Some(ChannelState::Subscribing(_)) = self.state {
            if self.subscriptions == 0 {
                return std::future::pending().await;
            }
            if let Some(ChannelState::Subscribing(pubsub)) = self.state.take() {
                self.state = Some(ChannelState::Streaming(pubsub.into_on_message().boxed()));
            }
        }

        match self.state.as_mut() {
            Some(ChannelState::Streaming(stream)) => Ok(stream.next().await.map(|msg| {
                Frame::message(
                    msg.get_channel_name(),
                    Bytes::copy_from_slice(msg.get_payload_bytes()),
                )
            })),
            _ => Ok(None),
        }
    }
}
