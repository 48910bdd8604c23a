//! # Core Types
//!
//! Frame and delivery types shared between store clients and handlers.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a frame delivered by a pub/sub channel.
///
/// Stores acknowledge every subscribe/unsubscribe request with a frame on the
/// same connection that carries data messages. Only `Message` frames carry a
/// payload worth decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    Subscribe,
    Unsubscribe,
    Message,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Subscribe => write!(f, "subscribe"),
            FrameKind::Unsubscribe => write!(f, "unsubscribe"),
            FrameKind::Message => write!(f, "message"),
        }
    }
}

/// A single delivery from a pub/sub channel.
///
/// # Examples
///
/// ```rust
/// use pubkv_core::{Frame, FrameKind};
///
/// let frame = Frame::message("cfg", &b"{\"a\":1}"[..]);
/// assert_eq!(frame.kind, FrameKind::Message);
/// assert!(frame.is_message());
///
/// let ack = Frame::subscribed("cfg");
/// assert!(!ack.is_message());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub channel: String,
    pub payload: Bytes,
}

impl Frame {
    /// Creates a data frame published on `channel`.
    pub fn message(channel: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Message,
            channel: channel.into(),
            payload: payload.into(),
        }
    }

    /// Creates a subscribe acknowledgement for `channel`.
    pub fn subscribed(channel: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Subscribe,
            channel: channel.into(),
            payload: Bytes::new(),
        }
    }

    /// Creates an unsubscribe acknowledgement for `channel`.
    pub fn unsubscribed(channel: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Unsubscribe,
            channel: channel.into(),
            payload: Bytes::new(),
        }
    }

    pub fn is_message(&self) -> bool {
        self.kind == FrameKind::Message
    }
}

/// Where a subscription runner executes its delivery loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// The caller drives delivery, one message per `start()` call
    Foreground,
    /// A dedicated task delivers continuously
    #[default]
    Background,
}

impl DeliveryMode {
    pub fn is_background(&self) -> bool {
        matches!(self, DeliveryMode::Background)
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Foreground => write!(f, "foreground"),
            DeliveryMode::Background => write!(f, "background"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constructors() {
        let frame = Frame::message("raw", vec![1u8, 2]);
        assert_eq!(frame.channel, "raw");
        assert_eq!(frame.payload.as_ref(), &[1u8, 2]);
        assert!(frame.is_message());

        let ack = Frame::unsubscribed("raw");
        assert_eq!(ack.kind, FrameKind::Unsubscribe);
        assert!(ack.payload.is_empty());
    }

    #[test]
    fn test_delivery_mode_default_is_background() {
        assert_eq!(DeliveryMode::default(), DeliveryMode::Background);
        assert!(DeliveryMode::Background.is_background());
        assert!(!DeliveryMode::Foreground.is_background());
        assert_eq!(DeliveryMode::Foreground.to_string(), "foreground");
    }
}
