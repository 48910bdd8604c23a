//! # pubkv KVStore
//!
//! In-process key-value store with publish/subscribe, implementing the pubkv
//! store client capability.
//!
//! ## Features
//!
//! - **Flat Keyspace**: One byte value per key, last writer wins
//! - **Pub/Sub Bus**: Per-connection queues with subscribe acknowledgements
//! - **Replica Views**: Read-only handles over the same keyspace
//! - **Sentinel**: Named groups resolving to primary and replica views
//!
//! Useful for hermetic tests and for embedding handlers in a single process.

pub mod notifications;
pub mod operations;
pub mod sentinel;
pub mod store;

pub use notifications::{BusStats, MemoryPubSub, PubSubBus, SubscriptionId};
pub use operations::MemoryStoreError;
pub use sentinel::MemorySentinel;
pub use store::{MemoryStore, MemoryStoreConfig, StoreRole, StoreStats, ValueEntry};
