//! # Handler Factory
//!
//! Owns the one [`StoreEndpoint`] for a physical store and hands out typed
//! handlers that share it.

use crate::config::FactoryConfig;
use crate::endpoint::StoreEndpoint;
use crate::handler::{BytesHandler, DictHandler, ImageHandler, JsonHandler, TypedHandler};
use pubkv_core::{
    BytesCodec, DictCodec, ImageCodec, JsonCodec, Result, StoreClient, StoreTarget, ValueCodec,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Builds typed handlers over one shared endpoint.
///
/// Handlers for the same topic are independent: each owns its own
/// subscription state.
#[derive(Debug, Clone)]
pub struct HandlerFactory {
    endpoint: Arc<StoreEndpoint>,
    config: FactoryConfig,
}

impl HandlerFactory {
    /// Factory over a single connection with default settings
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self::from_endpoint(Arc::new(StoreEndpoint::simple(client)))
    }

    /// Resolve `target` into an endpoint. See [`StoreEndpoint::connect`].
    pub async fn connect(target: StoreTarget, sentinel_name: Option<&str>) -> Result<Self> {
        let endpoint = StoreEndpoint::connect(target, sentinel_name).await?;
        Ok(Self::from_endpoint(Arc::new(endpoint)))
    }

    pub fn from_endpoint(endpoint: Arc<StoreEndpoint>) -> Self {
        Self {
            endpoint,
            config: FactoryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn endpoint(&self) -> &Arc<StoreEndpoint> {
        &self.endpoint
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn make_dict_handler(&self, topic: impl Into<String>) -> DictHandler {
        self.make_handler(topic, DictCodec::new())
    }

    pub fn make_bytes_handler(&self, topic: impl Into<String>) -> BytesHandler {
        self.make_handler(topic, BytesCodec)
    }

    /// Image handler writing the factory's configured encoding
    pub fn make_image_handler(&self, topic: impl Into<String>) -> ImageHandler {
        self.make_handler(topic, ImageCodec::new(self.config.image_encoding))
    }

    pub fn make_json_handler<T>(&self, topic: impl Into<String>) -> JsonHandler<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.make_handler(topic, JsonCodec::new())
    }

    /// Handler for a caller-supplied codec
    pub fn make_handler<C: ValueCodec>(
        &self,
        topic: impl Into<String>,
        codec: C,
    ) -> TypedHandler<C> {
        let topic = topic.into();
        debug!("Creating {} handler for topic {}", codec.name(), topic);
        TypedHandler::new(
            Arc::clone(&self.endpoint),
            topic,
            codec,
            self.config.subscription.clone(),
        )
    }
}
