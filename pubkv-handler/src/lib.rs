//! # pubkv Handler
//!
//! Typed, per-topic access to a key-value store with publish/subscribe.
//!
//! A topic name is used both as the key holding the topic's current value and
//! as the pub/sub channel carrying updates. Handlers pair a topic with a
//! [`ValueCodec`](pubkv_core::ValueCodec) so callers work with domain values
//! instead of bytes.
//!
//! ## Key Components
//!
//! - **StoreEndpoint**: Primary (write) and secondary (read) connections
//! - **HandlerFactory**: Owns one endpoint and builds handlers over it
//! - **TypedHandler**: get/set/publish/delete plus subscriptions for one topic
//! - **SubscriptionRunner**: Foreground or background delivery of channel frames
//!
//! ## Example Usage
//!
//! ```rust
//! use pubkv_handler::HandlerFactory;
//! use pubkv_kvstore::MemoryStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> pubkv_core::Result<()> {
//!     let factory = HandlerFactory::new(Arc::new(MemoryStore::default()));
//!     let cfg = factory.make_dict_handler("cfg");
//!
//!     cfg.subscribe(|value| println!("cfg changed: {:?}", value)).await?;
//!
//!     let value = json!({"a": 1}).as_object().cloned().unwrap_or_default();
//!     cfg.set(&value).await?;
//!     cfg.publish(&value).await?;
//!     assert_eq!(cfg.get().await?, Some(value));
//!
//!     cfg.stop_subscription().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod endpoint;
pub mod factory;
pub mod handler;
pub mod runner;

pub use config::{FactoryConfig, SubscriptionConfig};
pub use endpoint::StoreEndpoint;
pub use factory::HandlerFactory;
pub use handler::{BytesHandler, DictHandler, ImageHandler, JsonHandler, TypedHandler};
pub use runner::{FrameCallback, SubscriptionRunner};
