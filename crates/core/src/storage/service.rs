//! Signing service: one backend selected at startup.
//!
//! Access URLs and the Azure upload come from the OpenDAL operator's
//! presigned requests; S3 and GCS uploads are signed browser forms.

use std::time::Duration;

use chrono::Utc;
use opendal::Operator;
use tracing::debug;

use super::azure;
use super::config::{StorageBackend, StorageConfig};
use super::error::StorageError;
use super::gcs::{self, GcsSigner};
use super::keys::ObjectKey;
use super::s3::{self, S3Signer};
use super::signer::{AuthorizationRequest, FormSigner, expiry};
use super::types::{AccessAction, AuthorizationResponse, SignedAccessUrl, UploadAuthorization};

/// An upload authorization together with the read URL for the same key.
#[derive(Debug, Clone)]
pub struct AuthorizedUpload {
    /// Key the authorization was minted for.
    pub key: ObjectKey,
    /// How to upload.
    pub authorization: UploadAuthorization,
    /// How to read the object afterwards.
    pub access: SignedAccessUrl,
}

impl From<AuthorizedUpload> for AuthorizationResponse {
    fn from(authorized: AuthorizedUpload) -> Self {
        Self::new(authorized.authorization, &authorized.access)
    }
}

/// How upload authorizations are produced.
enum UploadSigner {
    /// Signed multipart form.
    Form(Box<dyn FormSigner>),
    /// Presigned raw blob PUT.
    Blob,
}

/// Produces upload authorizations and signed access URLs.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct SigningService {
    operator: Operator,
    uploads: UploadSigner,
    backend: &'static str,
    upload_ttl_secs: u64,
    access_ttl_secs: u64,
    max_upload_mb: u64,
}

impl SigningService {
    /// Build the operator and upload signer for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the backend credentials cannot be parsed.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let (operator, uploads) = match &config.backend {
            StorageBackend::S3 {
                region,
                access_key_id,
                secret_access_key,
                endpoint,
            } => {
                let endpoint = endpoint.as_deref();
                let operator =
                    s3::operator(config, region, access_key_id, secret_access_key, endpoint)?;
                let signer =
                    S3Signer::new(config, region, access_key_id, secret_access_key, endpoint)?;
                (operator, UploadSigner::Form(Box::new(signer)))
            }
            StorageBackend::Gcs {
                client_email,
                private_key_pem,
                ..
            } => {
                let signer = GcsSigner::new(config, client_email, private_key_pem)?;
                let operator = gcs::operator(config, client_email, private_key_pem)?;
                (operator, UploadSigner::Form(Box::new(signer)))
            }
            StorageBackend::Azure {
                account,
                access_key,
                endpoint,
            } => {
                let operator = azure::operator(config, account, access_key, endpoint.as_deref())?;
                (operator, UploadSigner::Blob)
            }
        };

        Ok(Self {
            operator,
            uploads,
            backend: config.backend.name(),
            upload_ttl_secs: config.upload_ttl_secs,
            access_ttl_secs: config.access_ttl_secs,
            max_upload_mb: config.max_upload_mb,
        })
    }

    /// Mint a write authorization for `key`, restricted to its prefix.
    ///
    /// # Errors
    ///
    /// Returns `Signing` if the provider signature cannot be produced.
    pub async fn request_upload_authorization(
        &self,
        key: &ObjectKey,
        content_type: Option<&str>,
        max_size_mb: u64,
    ) -> Result<UploadAuthorization, StorageError> {
        let request = AuthorizationRequest {
            key,
            content_type,
            max_size_mb,
        };
        let now = Utc::now();

        match &self.uploads {
            UploadSigner::Form(signer) => signer.upload_authorization(&request, now),
            UploadSigner::Blob => {
                let expires_at = expiry(now, self.upload_ttl_secs)?;
                let presigned = self
                    .operator
                    .presign_write(key.as_str(), Duration::from_secs(self.upload_ttl_secs))
                    .await?;
                let headers = presigned
                    .header()
                    .iter()
                    .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)));
                Ok(azure::upload_authorization(
                    presigned.uri().to_string(),
                    headers,
                    &request,
                    expires_at,
                ))
            }
        }
    }

    /// Mint a signed URL for reading or writing `key`.
    ///
    /// # Errors
    ///
    /// Returns `Signing` if the operator cannot presign the request.
    pub async fn request_signed_access_url(
        &self,
        key: &str,
        action: AccessAction,
    ) -> Result<SignedAccessUrl, StorageError> {
        let expires_at = expiry(Utc::now(), self.access_ttl_secs)?;
        let ttl = Duration::from_secs(self.access_ttl_secs);
        let presigned = match action {
            AccessAction::Read => self.operator.presign_read(key, ttl).await?,
            AccessAction::Write => self.operator.presign_write(key, ttl).await?,
        };

        Ok(SignedAccessUrl {
            url: presigned.uri().to_string(),
            action,
            expires_at,
        })
    }

    /// Build the key for `file_name` and return its upload authorization
    /// plus read URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for unsafe segments, or a signing error.
    pub async fn authorize(
        &self,
        project_id: Option<&str>,
        thread_id: Option<&str>,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<AuthorizedUpload, StorageError> {
        let key = ObjectKey::build(project_id, thread_id, file_name)?;
        let authorization = self
            .request_upload_authorization(&key, content_type, self.max_upload_mb)
            .await?;
        let access = self
            .request_signed_access_url(key.as_str(), AccessAction::Read)
            .await?;

        debug!(
            backend = self.backend,
            object_key = %key,
            method = authorization.method.as_str(),
            "upload authorized"
        );

        Ok(AuthorizedUpload {
            key,
            authorization,
            access,
        })
    }

    /// Active backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend
    }

    /// Upload size limit in megabytes.
    #[must_use]
    pub fn max_upload_mb(&self) -> u64 {
        self.max_upload_mb
    }
}
