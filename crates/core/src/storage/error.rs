//! Storage error types.

use thiserror::Error;

/// Storage signing errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// No storage backend selected.
    #[error("no storage backend selected: set exactly one of S3, GCS or Azure")]
    UnsupportedBackend,

    /// Invalid storage key segment.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Signature computation failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Signing(err.to_string()),
        }
    }
}
