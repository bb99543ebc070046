//! Upload input, outcome and wire types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::UploadError;
use crate::storage::{AuthorizationResponse, AuthorizedUpload, UploadAuthorization, UploadMethod};

/// Content type used when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from a client.
#[derive(Debug, Clone, Default)]
pub struct UploadInput {
    /// File contents.
    pub bytes: Bytes,
    /// Client-supplied file name. Logged only, never used for the key.
    pub file_name: Option<String>,
    /// Declared content type.
    pub content_type: Option<String>,
    /// Conversation thread the file belongs to.
    pub thread_id: Option<String>,
    /// Project the file belongs to.
    pub project_id: Option<String>,
}

impl UploadInput {
    /// Create an input from raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    /// Set the client file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the thread.
    #[must_use]
    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Set the project.
    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Declared content type, or `application/octet-stream`.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// A usable authorization plus the read URL for the same object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedUpload {
    /// How to upload.
    pub authorization: UploadAuthorization,
    /// Signed read URL returned to the client on success.
    pub signed_url: String,
}

impl GrantedUpload {
    /// Validate a wire envelope.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAuthorization` unless `put` or `post` is present with
    /// a non-empty url and the envelope carries a read URL. `put` wins when
    /// both are present.
    pub fn from_response(response: AuthorizationResponse) -> Result<Self, UploadError> {
        let (method, payload) = match (response.put, response.post) {
            (Some(put), _) => (UploadMethod::Put, put),
            (None, Some(post)) => (UploadMethod::Post, post),
            (None, None) => {
                return Err(UploadError::invalid_authorization(
                    "authorization carries neither put nor post",
                ));
            }
        };

        let url = payload
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| UploadError::invalid_authorization("authorization has no url"))?;
        let signed_url = response
            .signed_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| UploadError::invalid_authorization("authorization has no signed_url"))?;

        Ok(Self {
            authorization: UploadAuthorization {
                method,
                url,
                headers: payload.headers.unwrap_or_default(),
                fields: payload.fields,
                upload_type: payload.upload_type,
                expires_at: payload.expires_at,
            },
            signed_url,
        })
    }
}

impl From<AuthorizedUpload> for GrantedUpload {
    fn from(authorized: AuthorizedUpload) -> Self {
        Self {
            authorization: authorized.authorization,
            signed_url: authorized.access.url,
        }
    }
}

/// Why an upload did not happen. Logged, never shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadFailure {
    /// The authorization step failed or was refused.
    #[error("authorization request failed: {0}")]
    AuthorizationRequest(String),

    /// The upload request never got a response.
    #[error("upload transport failed: {0}")]
    Transport(String),

    /// The store answered with a non-2xx status.
    #[error("store rejected upload with status {status}")]
    Rejected {
        /// HTTP status returned by the store.
        status: u16,
    },
}

/// Result of one relay attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The store accepted the bytes.
    Stored {
        /// Key the object was written under.
        object_key: String,
        /// Signed read URL.
        url: String,
    },
    /// Nothing was stored.
    Failed(UploadFailure),
}

/// Public result: both fields set, or both null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Stored object key.
    pub object_key: Option<String>,
    /// Signed read URL.
    pub url: Option<String>,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Stored { object_key, url } => Self {
                object_key: Some(object_key),
                url: Some(url),
            },
            UploadOutcome::Failed(_) => Self {
                object_key: None,
                url: None,
            },
        }
    }
}
