//! # Store Errors
//!
//! Errors raised by the in-memory store before they are handed to handlers.

use pubkv_core::PubKvError;
use thiserror::Error;

/// Errors that can occur during in-memory store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryStoreError {
    /// Invalid key provided
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value is too large to store
    #[error("Value too large: {size} bytes exceeds limit of {max}")]
    ValueTooLarge { size: usize, max: usize },

    /// Store has reached maximum capacity
    #[error("Store is full")]
    StoreFull,

    /// Write attempted through a replica view
    #[error("READONLY You can't write against a read only replica.")]
    ReadOnly,

    /// Sentinel has no group with this name
    #[error("No master found for group '{0}'")]
    UnknownGroup(String),
}

impl MemoryStoreError {
    /// Check if this error indicates a client error
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MemoryStoreError::InvalidKey(_) | MemoryStoreError::ValueTooLarge { .. }
        )
    }
}

impl From<MemoryStoreError> for PubKvError {
    fn from(error: MemoryStoreError) -> Self {
        PubKvError::store(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        assert!(MemoryStoreError::InvalidKey("".to_string()).is_client_error());
        assert!(MemoryStoreError::ValueTooLarge { size: 10, max: 5 }.is_client_error());
        assert!(!MemoryStoreError::ReadOnly.is_client_error());
        assert!(!MemoryStoreError::StoreFull.is_client_error());
    }

    #[test]
    fn test_conversion_keeps_message_verbatim() {
        let error: PubKvError = MemoryStoreError::ReadOnly.into();
        assert!(error.is_retryable());
        assert_eq!(
            error.to_string(),
            "Store error: READONLY You can't write against a read only replica."
        );
    }
}
