//! # Typed Topic Handler
//!
//! Binds one endpoint, one topic and one codec. Reads go through the
//! secondary connection, writes and publishes through the primary, and
//! `subscribe` turns the topic's pub/sub channel into decoded callbacks.

use crate::config::SubscriptionConfig;
use crate::endpoint::StoreEndpoint;
use crate::runner::{FrameCallback, SubscriptionRunner};
use parking_lot::RwLock;
use pubkv_core::{
    BytesCodec, DeliveryMode, DictCodec, Frame, ImageCodec, JsonCodec, PubKvError, Result,
    ValueCodec,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

type Pipeline = Arc<dyn Fn(&Frame) + Send + Sync>;

/// Handler for JSON objects
pub type DictHandler = TypedHandler<DictCodec>;
/// Handler for raw bytes
pub type BytesHandler = TypedHandler<BytesCodec>;
/// Handler for RGB images
pub type ImageHandler = TypedHandler<ImageCodec>;
/// Handler for any serde type stored as JSON
pub type JsonHandler<T> = TypedHandler<JsonCodec<T>>;

/// Typed access to one topic.
///
/// Subscription lifecycle: `subscribe` arms a runner (a no-op while one is
/// armed), `stop_subscription` stops and discards it, after which
/// `subscribe` may arm a fresh one. Call `stop_subscription` before dropping
/// a subscribed handler; dropping it anyway aborts the background task.
pub struct TypedHandler<C: ValueCodec> {
    endpoint: Arc<StoreEndpoint>,
    topic: String,
    codec: Arc<C>,
    config: SubscriptionConfig,
    runner: Mutex<Option<Arc<SubscriptionRunner>>>,
    latest: Arc<watch::Sender<Option<Frame>>>,
    pipeline: Arc<RwLock<Option<Pipeline>>>,
}

impl<C: ValueCodec> TypedHandler<C> {
    pub fn new(
        endpoint: Arc<StoreEndpoint>,
        topic: impl Into<String>,
        codec: C,
        config: SubscriptionConfig,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            endpoint,
            topic: topic.into(),
            codec: Arc::new(codec),
            config,
            runner: Mutex::new(None),
            latest: Arc::new(latest),
            pipeline: Arc::new(RwLock::new(None)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn endpoint(&self) -> &Arc<StoreEndpoint> {
        &self.endpoint
    }

    /// Read and decode the stored value.
    ///
    /// Missing and undecodable values both come back as `Ok(None)`; only
    /// store failures are errors.
    pub async fn get(&self) -> Result<Option<C::Value>> {
        let payload = self.endpoint.secondary().get(&self.topic).await?;
        Ok(self.codec.decode_absent(payload.as_deref()))
    }

    /// Encode and store `value`, replacing whatever was there.
    pub async fn set(&self, value: &C::Value) -> Result<()> {
        let payload = self.codec.encode(value)?;
        debug!("Setting topic {} ({} bytes)", self.topic, payload.len());
        self.endpoint.primary().set(&self.topic, payload).await
    }

    /// Encode and publish `value` on the topic's channel.
    ///
    /// Does not store the value. Returns the number of receivers.
    pub async fn publish(&self, value: &C::Value) -> Result<usize> {
        let payload = self.codec.encode(value)?;
        let receivers = self.endpoint.primary().publish(&self.topic, payload).await?;
        debug!("Published on topic {} to {} receivers", self.topic, receivers);
        Ok(receivers)
    }

    /// Remove the stored value. Live subscriptions are unaffected.
    pub async fn delete(&self) -> Result<bool> {
        self.endpoint.primary().delete(&self.topic).await
    }

    /// Subscribe with the configured delivery mode (background by default).
    pub async fn subscribe<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(C::Value) + Send + Sync + 'static,
    {
        self.subscribe_with_mode(callback, self.config.delivery_mode)
            .await
    }

    /// Arm a subscription on the topic.
    ///
    /// Every received frame is pushed into the latest-value cell, then
    /// decoded and handed to `callback`. Frames that fail to decode are
    /// logged and skipped. In foreground mode nothing is delivered until
    /// [`TypedHandler::start`] is called.
    pub async fn subscribe_with_mode<F>(&self, callback: F, mode: DeliveryMode) -> Result<()>
    where
        F: Fn(C::Value) + Send + Sync + 'static,
    {
        let mut slot = self.runner.lock().await;
        if slot.is_some() {
            debug!("Topic {} already subscribed", self.topic);
            return Ok(());
        }

        let channel = self.endpoint.secondary().pubsub().await?;
        let mut runner = SubscriptionRunner::new(channel, mode, self.config.clone());

        *self.pipeline.write() = Some(self.build_pipeline(callback));

        if let Err(e) = runner.register_topic(&self.topic, self.ingest()).await {
            runner.stop().await;
            *self.pipeline.write() = None;
            return Err(e);
        }

        *slot = Some(Arc::new(runner));
        info!("Subscribed to topic {} ({})", self.topic, mode);
        Ok(())
    }

    /// Receive and dispatch one frame of a foreground subscription.
    ///
    /// Waits until a frame arrives, or fails once `stop_subscription` is
    /// called. A no-op for background subscriptions.
    pub async fn start(&self) -> Result<()> {
        let runner = self
            .runner
            .lock()
            .await
            .clone()
            .ok_or_else(|| PubKvError::subscription(&self.topic, "not subscribed"))?;
        runner.start().await
    }

    /// Stop delivery and detach the callback. Safe to call repeatedly.
    pub async fn stop_subscription(&self) {
        let mut slot = self.runner.lock().await;
        if let Some(runner) = slot.take() {
            runner.stop().await;
            info!("Subscription to topic {} stopped", self.topic);
        }
        *self.pipeline.write() = None;
    }

    pub async fn is_subscribed(&self) -> bool {
        self.runner.lock().await.is_some()
    }

    /// True while a background subscription task is running
    pub async fn is_alive(&self) -> bool {
        self.runner
            .lock()
            .await
            .as_ref()
            .is_some_and(|runner| runner.is_alive())
    }

    /// Decoded value of the most recently received frame
    pub fn latest(&self) -> Option<C::Value> {
        let frame = self.latest.borrow().clone()?;
        self.codec.decode_absent(Some(&frame.payload[..]))
    }

    /// Observe the latest received frame. Only the newest frame is kept.
    pub fn watch_latest(&self) -> watch::Receiver<Option<Frame>> {
        self.latest.subscribe()
    }

    fn ingest(&self) -> FrameCallback {
        let latest = Arc::clone(&self.latest);
        let pipeline = Arc::clone(&self.pipeline);

        Arc::new(move |frame: Frame| {
            latest.send_replace(Some(frame.clone()));
            let stage = pipeline.read().clone();
            if let Some(stage) = stage {
                stage(&frame);
            }
        })
    }

    fn build_pipeline<F>(&self, callback: F) -> Pipeline
    where
        F: Fn(C::Value) + Send + Sync + 'static,
    {
        let codec = Arc::clone(&self.codec);
        let topic = self.topic.clone();

        Arc::new(move |frame: &Frame| {
            if !frame.is_message() {
                return;
            }
            match codec.decode(&frame.payload) {
                Ok(value) => callback(value),
                Err(e) => warn!("Dropping frame on topic {}: {}", topic, e),
            }
        })
    }
}

impl<C: ValueCodec> std::fmt::Debug for TypedHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedHandler")
            .field("topic", &self.topic)
            .field("codec", &self.codec.name())
            .finish()
    }
}
