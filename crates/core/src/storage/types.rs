//! Upload authorization and access URL types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP method an upload authorization is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// Raw body or form PUT.
    Put,
    /// Form POST.
    Post,
}

impl UploadMethod {
    /// HTTP method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

/// How the file bytes travel in the upload request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    /// File bytes are the request body.
    Raw,
    /// Form with every authorization field plus a `file` part.
    #[default]
    Multipart,
}

/// What a signed access URL allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessAction {
    /// Download the object.
    #[default]
    Read,
    /// Overwrite the object.
    Write,
}

/// Provider-specific permission to write one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAuthorization {
    /// HTTP method to use.
    pub method: UploadMethod,
    /// Destination endpoint.
    pub url: String,
    /// Headers the provider requires on the upload request.
    pub headers: BTreeMap<String, String>,
    /// Form fields (POST policies) and the object key.
    pub fields: BTreeMap<String, String>,
    /// Body encoding.
    pub upload_type: UploadType,
    /// When the authorization expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl UploadAuthorization {
    /// Object key echoed back in the form fields, if any.
    #[must_use]
    pub fn object_key(&self) -> Option<&str> {
        self.fields.get("key").map(String::as_str)
    }
}

/// Time-limited URL over an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAccessUrl {
    /// The signed URL.
    pub url: String,
    /// Operation the URL grants.
    pub action: AccessAction,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Wire form of an upload authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPayload {
    /// Destination endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Form fields.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Required headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Body encoding.
    #[serde(rename = "uploadType", default)]
    pub upload_type: UploadType,
    /// Expiry of the authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Wire envelope keyed by the HTTP method, merged with the read URL.
///
/// ```json
/// {"post": {"url": "...", "fields": {"key": "..."}, "uploadType": "multipart"},
///  "signed_url": "..."}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// PUT-style authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<AuthorizationPayload>,
    /// POST-style authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<AuthorizationPayload>,
    /// Signed read URL for the same key.
    #[serde(default, alias = "signedUrl", skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
}

impl AuthorizationResponse {
    /// Merge an authorization and its access URL into the wire envelope.
    #[must_use]
    pub fn new(authorization: UploadAuthorization, access: &SignedAccessUrl) -> Self {
        let method = authorization.method;
        let payload = AuthorizationPayload::from(authorization);
        let (put, post) = match method {
            UploadMethod::Put => (Some(payload), None),
            UploadMethod::Post => (None, Some(payload)),
        };
        Self {
            put,
            post,
            signed_url: Some(access.url.clone()),
        }
    }
}

impl From<UploadAuthorization> for AuthorizationPayload {
    fn from(authorization: UploadAuthorization) -> Self {
        Self {
            url: Some(authorization.url),
            fields: authorization.fields,
            headers: (!authorization.headers.is_empty()).then_some(authorization.headers),
            upload_type: authorization.upload_type,
            expires_at: authorization.expires_at,
        }
    }
}
