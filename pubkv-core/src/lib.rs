//! # pubkv Core
//!
//! Core components shared by pubkv store backends and typed topic handlers.
//!
//! ## Components
//!
//! - **Store Client Traits**: The minimal operation set consumed from a backing
//!   key-value store with publish/subscribe (`StoreClient`, `PubSubChannel`,
//!   `SentinelResolver`)
//! - **Frames**: Deliveries from a pub/sub channel, acknowledgements included
//! - **Value Codecs**: Swappable mappings between domain values and payloads
//! - **Error Handling**: One error enum for every crate in the workspace
//!
//! ## Writing a Codec
//!
//! ```rust
//! use bytes::Bytes;
//! use pubkv_core::{PubKvError, Result, ValueCodec};
//!
//! pub struct Utf8Codec;
//!
//! impl ValueCodec for Utf8Codec {
//!     type Value = String;
//!
//!     fn name(&self) -> &'static str {
//!         "utf8"
//!     }
//!
//!     fn encode(&self, value: &String) -> Result<Bytes> {
//!         Ok(Bytes::from(value.clone()))
//!     }
//!
//!     fn decode(&self, payload: &[u8]) -> Result<String> {
//!         String::from_utf8(payload.to_vec())
//!             .map_err(|e| PubKvError::decode(self.name(), e.to_string()))
//!     }
//! }
//!
//! let codec = Utf8Codec;
//! assert_eq!(codec.decode_absent(Some(&b"hello"[..])), Some("hello".to_string()));
//! assert_eq!(codec.decode_absent(Some(&[0xffu8][..])), None);
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod types;

pub use client::{PubSubChannel, SentinelResolver, StoreClient, StoreTarget};
pub use codec::{
    BincodeCodec, BytesCodec, DictCodec, DictValue, ImageCodec, ImageEncoding, JsonCodec,
    ValueCodec,
};
pub use error::*;
pub use types::*;
