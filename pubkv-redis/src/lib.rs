//! # pubkv Redis
//!
//! Redis-backed implementations of the pubkv store capabilities.
//!
//! - **RedisStore**: Key-value commands and publishing over a multiplexed
//!   connection, with a dedicated connection per pub/sub channel
//! - **RedisSentinel**: Master and replica resolution for a sentinel group
//! - **connect_target**: Builds a [`StoreTarget`] from a [`RedisConfig`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pubkv_redis::{connect_target, RedisConfig};
//!
//! #[tokio::main]
//! async fn main() -> pubkv_core::Result<()> {
//!     let config = RedisConfig::sentinel(["redis://127.0.0.1:26379"], "mymaster");
//!     let target = connect_target(&config).await?;
//!     assert!(target.is_high_availability());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod sentinel;
pub mod store;

pub use config::RedisConfig;
pub use error::RedisStoreError;
pub use sentinel::RedisSentinel;
pub use store::{RedisPubSub, RedisStore};

use pubkv_core::{Result, StoreTarget};
use std::sync::Arc;

/// Validate `config` and build the matching store target.
///
/// Sentinel targets are not contacted until an endpoint resolves a group.
pub async fn connect_target(config: &RedisConfig) -> Result<StoreTarget> {
    config.validate()?;

    if config.is_sentinel() {
        let sentinel = RedisSentinel::new(&config.sentinel_urls)?;
        Ok(StoreTarget::HighAvailability(Arc::new(sentinel)))
    } else {
        let store = RedisStore::open(&config.url).await?;
        Ok(StoreTarget::Simple(Arc::new(store)))
    }
}
