//! Upload error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Hard upload errors, surfaced to the caller as request errors.
///
/// Soft failures (authorization refused, store rejected the write) are not
/// errors; see [`UploadOutcome`](super::UploadOutcome).
#[derive(Debug, Error)]
pub enum UploadError {
    /// Authorization payload is unusable (no url, no method, no read URL).
    #[error("invalid authorization: {0}")]
    InvalidAuthorization(String),

    /// Content type cannot be sent as a header value.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// Key or signing failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Create an invalid authorization error.
    #[must_use]
    pub fn invalid_authorization(msg: impl Into<String>) -> Self {
        Self::InvalidAuthorization(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller sent something unusable.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAuthorization(_)
                | Self::InvalidContentType(_)
                | Self::Storage(StorageError::InvalidKey(_))
        )
    }
}
