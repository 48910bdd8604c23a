//! # Redis Backend Errors

use pubkv_core::PubKvError;
use thiserror::Error;

/// Errors raised by the Redis backend before they reach handlers
#[derive(Error, Debug)]
pub enum RedisStoreError {
    /// Error reported by the redis client or server
    #[error(transparent)]
    Backend(#[from] redis::RedisError),

    /// Subscribe attempted after the channel started streaming messages
    #[error("Cannot subscribe to '{0}' after message delivery has started")]
    SubscribeWhileStreaming(String),
}

impl RedisStoreError {
    /// Connection-level failures that may succeed on a later attempt
    pub fn is_connection_error(&self) -> bool {
        match self {
            RedisStoreError::Backend(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
            }
            RedisStoreError::SubscribeWhileStreaming(_) => false,
        }
    }
}

impl From<RedisStoreError> for PubKvError {
    fn from(error: RedisStoreError) -> Self {
        match error {
            RedisStoreError::SubscribeWhileStreaming(channel) => PubKvError::subscription(
                channel,
                "cannot subscribe after message delivery has started",
            ),
            backend => PubKvError::store(backend.to_string()),
        }
    }
}
