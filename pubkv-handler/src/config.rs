use pubkv_core::{DeliveryMode, ImageEncoding};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Mode used by `TypedHandler::subscribe`
    pub delivery_mode: DeliveryMode,
    /// How long `stop` waits for the background task before aborting it.
    ///
    /// The abort lands at the task's next await point, so a callback that
    /// never returns still blocks `stop` past this limit.
    pub stop_timeout: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            delivery_mode: DeliveryMode::Background,
            stop_timeout: Duration::from_millis(5000),
        }
    }
}

impl SubscriptionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FactoryConfig {
    pub image_encoding: ImageEncoding,
    pub subscription: SubscriptionConfig,
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_encoding(mut self, encoding: ImageEncoding) -> Self {
        self.image_encoding = encoding;
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionConfig) -> Self {
        self.subscription = subscription;
        self
    }
}
