//! Upload orchestrator: authorize, execute, reconcile.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::UploadError;
use super::source::{AuthorizationOutcome, AuthorizationSource, AuthorizeRequest, Authorizer};
use super::types::{GrantedUpload, UploadFailure, UploadInput, UploadOutcome};
use crate::storage::{ObjectKey, UploadAuthorization, UploadMethod, UploadType};

/// Build the shared outbound client with a per-request timeout.
///
/// # Errors
///
/// Returns `Internal` if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, UploadError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| UploadError::internal(format!("failed to build HTTP client: {e}")))
}

/// Relays client files to the object store.
pub struct UploadOrchestrator<A: AuthorizationSource = Authorizer> {
    source: A,
    client: reqwest::Client,
}

impl<A: AuthorizationSource> UploadOrchestrator<A> {
    /// Create an orchestrator using `client` for upload requests.
    #[must_use]
    pub fn new(source: A, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    /// Store `input` under a freshly generated key.
    ///
    /// Authorization and store failures come back as
    /// `Ok(UploadOutcome::Failed(..))`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable content type, an invalid project or
    /// thread segment, or an unusable authorization payload.
    pub async fn upload(&self, input: UploadInput) -> Result<UploadOutcome, UploadError> {
        let content_type = input.content_type().to_string();
        let content_type_header = parse_content_type(&content_type)?;

        let file_id = Uuid::new_v4().to_string();
        let key = ObjectKey::build(
            input.project_id.as_deref(),
            input.thread_id.as_deref(),
            &file_id,
        )?;
        debug!(
            object_key = %key,
            file_name = ?input.file_name,
            size = input.bytes.len(),
            "relaying upload"
        );

        let request = AuthorizeRequest {
            project_id: input.project_id.clone(),
            content_type: Some(content_type.clone()),
            thread_id: input.thread_id.clone(),
            file_name: file_id.clone(),
        };
        let granted = match self.source.authorize(&request).await? {
            AuthorizationOutcome::Granted(granted) => granted,
            AuthorizationOutcome::Failed(failure) => {
                warn!(object_key = %key, reason = %failure, "upload authorization failed");
                return Ok(UploadOutcome::Failed(failure));
            }
        };

        let size = input.bytes.len();
        let request = self.build_request(
            &granted.authorization,
            input,
            &file_id,
            &content_type,
            content_type_header,
        )?;

        let failure = match request.send().await {
            Ok(response) if response.status().is_success() => None,
            Ok(response) => Some(UploadFailure::Rejected {
                status: response.status().as_u16(),
            }),
            Err(e) => Some(UploadFailure::Transport(e.to_string())),
        };
        if let Some(failure) = failure {
            warn!(object_key = %key, reason = %failure, "upload failed");
            return Ok(UploadOutcome::Failed(failure));
        }

        let GrantedUpload {
            authorization,
            signed_url,
        } = granted;
        let object_key = authorization
            .object_key()
            .map_or_else(|| key.as_str().to_string(), String::from);
        info!(object_key = %object_key, size, "upload stored");

        Ok(UploadOutcome::Stored {
            object_key,
            url: signed_url,
        })
    }

    /// Turn an authorization into the outbound request.
    fn build_request(
        &self,
        authorization: &UploadAuthorization,
        input: UploadInput,
        file_id: &str,
        content_type: &str,
        content_type_header: HeaderValue,
    ) -> Result<RequestBuilder, UploadError> {
        let method = match authorization.method {
            UploadMethod::Put => Method::PUT,
            UploadMethod::Post => Method::POST,
        };
        let mut headers = authorization_headers(authorization)?;
        let builder = self.client.request(method, authorization.url.as_str());

        match authorization.upload_type {
            UploadType::Raw => {
                headers.entry(CONTENT_TYPE).or_insert(content_type_header);
                Ok(builder.headers(headers).body(input.bytes))
            }
            UploadType::Multipart => {
                headers.remove(CONTENT_TYPE);
                let mut form = Form::new();
                for (name, value) in &authorization.fields {
                    form = form.text(name.clone(), value.clone());
                }
                let length = input.bytes.len() as u64;
                let file = Part::stream_with_length(reqwest::Body::from(input.bytes), length)
                    .file_name(file_id.to_string())
                    .mime_str(content_type)
                    .map_err(|_| UploadError::InvalidContentType(content_type.to_string()))?;
                Ok(builder.headers(headers).multipart(form.part("file", file)))
            }
        }
    }
}

fn parse_content_type(content_type: &str) -> Result<HeaderValue, UploadError> {
    let valid = content_type
        .split_once('/')
        .is_some_and(|(kind, subtype)| !kind.is_empty() && !subtype.is_empty());
    if !valid {
        return Err(UploadError::InvalidContentType(content_type.to_string()));
    }
    HeaderValue::from_str(content_type)
        .map_err(|_| UploadError::InvalidContentType(content_type.to_string()))
}

fn authorization_headers(authorization: &UploadAuthorization) -> Result<HeaderMap, UploadError> {
    let mut headers = HeaderMap::with_capacity(authorization.headers.len());
    for (name, value) in &authorization.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            UploadError::invalid_authorization(format!("invalid header name {name}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            UploadError::invalid_authorization(format!("invalid value for header {name}"))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
