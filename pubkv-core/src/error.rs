//! # Error Types
//!
//! Error handling shared by every pubkv crate.

use thiserror::Error;

/// Error types that can occur while working with typed topic handlers.
///
/// # Error Categories
///
/// - **Configuration Errors**: Invalid endpoint or factory construction
/// - **Codec Errors**: Values that cannot be encoded, payloads that cannot be decoded
/// - **Subscription Errors**: Misuse or failure of a subscription runner
/// - **Store Errors**: Failures reported verbatim by the backing store client
///
/// # Examples
///
/// ```rust
/// use pubkv_core::PubKvError;
///
/// let error = PubKvError::store("Connection refused");
/// assert!(error.is_retryable());
/// ```
#[derive(Error, Debug)]
pub enum PubKvError {
    /// Endpoint or factory was constructed with an invalid configuration
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// A payload could not be decoded into the codec's value type
    #[error("Decode error ({codec}): {reason}")]
    Decode { codec: &'static str, reason: String },

    /// A value could not be encoded into a payload
    #[error("Encode error ({codec}): {reason}")]
    Encode { codec: &'static str, reason: String },

    /// Subscription runner misuse or delivery failure
    #[error("Subscription error on topic '{topic}': {reason}")]
    Subscription { topic: String, reason: String },

    /// The backing store rejected the request or could not be reached
    #[error("Store error: {message}")]
    Store { message: String },
}

/// Type alias for Results across pubkv crates.
pub type Result<T> = std::result::Result<T, PubKvError>;

impl PubKvError {
    /// Creates a new configuration error with the given reason.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Creates a new decode error for the named codec.
    pub fn decode(codec: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            codec,
            reason: reason.into(),
        }
    }

    /// Creates a new encode error for the named codec.
    pub fn encode(codec: &'static str, reason: impl Into<String>) -> Self {
        Self::Encode {
            codec,
            reason: reason.into(),
        }
    }

    /// Creates a new subscription error for the given topic.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pubkv_core::PubKvError;
    ///
    /// let error = PubKvError::subscription("cfg", "already registered");
    /// assert_eq!(
    ///     error.to_string(),
    ///     "Subscription error on topic 'cfg': already registered"
    /// );
    /// ```
    pub fn subscription(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Subscription {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new store error carrying the backend's message verbatim.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Determines if this error condition is potentially transient.
    ///
    /// Only store errors qualify: this layer never retries on its own, but
    /// callers that own a retry policy can use this to decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    /// Returns true for errors caused by malformed payloads or values.
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Encode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let store_error = PubKvError::store("connection reset");
        let decode_error = PubKvError::decode("dict", "expected object");
        let config_error = PubKvError::configuration("missing sentinel name");

        assert!(store_error.is_retryable());
        assert!(!store_error.is_codec_error());

        assert!(!decode_error.is_retryable());
        assert!(decode_error.is_codec_error());

        assert!(!config_error.is_retryable());
        assert!(!config_error.is_codec_error());
    }

    #[test]
    fn test_every_variant_is_classified() {
        let errors = [
            PubKvError::configuration("missing sentinel name"),
            PubKvError::decode("dict", "expected object"),
            PubKvError::encode("image", "zero-sized image"),
            PubKvError::subscription("cfg", "runner is stopped"),
            PubKvError::store("connection reset"),
        ];

        let kinds: Vec<&str> = errors
            .iter()
            .map(|error| match error {
                PubKvError::Configuration { .. } => "configuration",
                PubKvError::Decode { .. } | PubKvError::Encode { .. } => "codec",
                PubKvError::Subscription { .. } => "subscription",
                PubKvError::Store { .. } => "store",
            })
            .collect();
        assert_eq!(kinds, ["configuration", "codec", "codec", "subscription", "store"]);
    }

    #[test]
    fn test_error_display() {
        let error = PubKvError::decode("image", "unsupported format");
        assert_eq!(error.to_string(), "Decode error (image): unsupported format");

        let error = PubKvError::store("READONLY You can't write against a read only replica.");
        assert!(error.to_string().starts_with("Store error: READONLY"));
    }
}
