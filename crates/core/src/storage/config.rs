//! Storage configuration types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use relay_shared::StorageSettings;

use super::error::StorageError;

/// Bytes per megabyte for upload size limits.
pub const ONE_MB: u64 = 1024 * 1024;

/// Storage backend with its credential bundle.
///
/// Exactly one backend is active per process.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// S3-compatible storage: AWS S3, MinIO, LocalStack
    S3 {
        /// AWS region.
        region: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// Endpoint override (path-style addressing when set).
        endpoint: Option<String>,
    },
    /// Google Cloud Storage
    Gcs {
        /// GCP project ID.
        project_id: Option<String>,
        /// Service account email.
        client_email: String,
        /// Decoded PEM private key.
        private_key_pem: String,
    },
    /// Azure Blob Storage
    Azure {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key (base64).
        access_key: String,
        /// Blob endpoint override (Azurite).
        endpoint: Option<String>,
    },
}

impl StorageBackend {
    /// Create S3-compatible backend.
    #[must_use]
    pub fn s3(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self::S3 {
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint: None,
        }
    }

    /// Create Google Cloud Storage backend.
    #[must_use]
    pub fn gcs(client_email: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self::Gcs {
            project_id: None,
            client_email: client_email.into(),
            private_key_pem: private_key_pem.into(),
        }
    }

    /// Create Azure Blob Storage backend.
    #[must_use]
    pub fn azure(account: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self::Azure {
            account: account.into(),
            access_key: access_key.into(),
            endpoint: None,
        }
    }

    /// Set an endpoint override (S3 and Azure only).
    #[must_use]
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        match &mut self {
            Self::S3 { endpoint, .. } | Self::Azure { endpoint, .. } => {
                *endpoint = Some(url.into());
            }
            Self::Gcs { .. } => {}
        }
        self
    }

    /// Get the backend name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::Gcs { .. } => "gcs",
            Self::Azure { .. } => "azure",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Active storage backend.
    pub backend: StorageBackend,
    /// Bucket (S3, GCS) or container (Azure) name.
    pub bucket: String,
    /// Upload authorization TTL in seconds (default: 60).
    pub upload_ttl_secs: u64,
    /// Signed access URL TTL in seconds (default: 3600 = 1 hour).
    pub access_ttl_secs: u64,
    /// Maximum upload size in megabytes (default: 30).
    pub max_upload_mb: u64,
}

impl StorageConfig {
    /// Default upload TTL: 1 minute.
    pub const DEFAULT_UPLOAD_TTL: u64 = 60;
    /// Default access TTL: 1 hour.
    pub const DEFAULT_ACCESS_TTL: u64 = 3600;
    /// Default max upload size: 30MB.
    pub const DEFAULT_MAX_UPLOAD_MB: u64 = 30;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(backend: StorageBackend, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            access_ttl_secs: Self::DEFAULT_ACCESS_TTL,
            max_upload_mb: Self::DEFAULT_MAX_UPLOAD_MB,
        }
    }

    /// Set upload authorization TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.upload_ttl_secs = secs;
        self
    }

    /// Set signed access URL TTL.
    #[must_use]
    pub fn with_access_ttl(mut self, secs: u64) -> Self {
        self.access_ttl_secs = secs;
        self
    }

    /// Set maximum upload size.
    #[must_use]
    pub fn with_max_upload_mb(mut self, mb: u64) -> Self {
        self.max_upload_mb = mb;
        self
    }

    /// Maximum upload size in bytes.
    #[must_use]
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(ONE_MB)
    }

    /// Validate raw settings into a typed configuration.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBackend` when no backend is selected, and
    /// `Configuration` when several are selected, the bucket is missing, or
    /// the selected backend lacks credentials.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let selected = [
            settings.is_using_s3,
            settings.is_using_gcs,
            settings.is_using_azure,
        ]
        .into_iter()
        .filter(|flag| *flag)
        .count();

        if selected > 1 {
            return Err(StorageError::configuration(
                "multiple storage backends selected, use only one",
            ));
        }
        if selected == 0 {
            return Err(StorageError::UnsupportedBackend);
        }

        let bucket = non_empty(settings.bucket_name.as_ref())
            .ok_or_else(|| StorageError::configuration("no bucket name configured"))?;

        let backend = if settings.is_using_s3 {
            StorageBackend::S3 {
                region: required(settings.aws_region.as_ref(), "S3 region")?,
                access_key_id: required(settings.aws_access_key.as_ref(), "S3 access key")?,
                secret_access_key: required(settings.aws_secret_key.as_ref(), "S3 secret key")?,
                endpoint: non_empty(settings.dev_aws_endpoint.as_ref()),
            }
        } else if settings.is_using_gcs {
            let encoded = required(settings.gcs_private_key.as_ref(), "GCS private key")?;
            StorageBackend::Gcs {
                project_id: non_empty(settings.gcs_project_id.as_ref()),
                client_email: required(settings.gcs_client_email.as_ref(), "GCS client email")?,
                private_key_pem: decode_private_key(&encoded)?,
            }
        } else {
            StorageBackend::Azure {
                account: required(
                    settings.azure_storage_account.as_ref(),
                    "Azure storage account",
                )?,
                access_key: required(settings.azure_storage_key.as_ref(), "Azure storage key")?,
                endpoint: non_empty(settings.dev_azure_endpoint.as_ref()),
            }
        };

        Ok(Self::new(backend, bucket)
            .with_upload_ttl(settings.upload_ttl_secs)
            .with_access_ttl(settings.access_ttl_secs)
            .with_max_upload_mb(settings.max_upload_mb))
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn required(value: Option<&String>, what: &str) -> Result<String, StorageError> {
    non_empty(value).ok_or_else(|| StorageError::configuration(format!("{what} not configured")))
}

/// Decode the base64-wrapped PEM key used for GCS service accounts.
fn decode_private_key(encoded: &str) -> Result<String, StorageError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| StorageError::configuration(format!("GCS private key is not base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|_| StorageError::configuration("GCS private key is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_settings() -> StorageSettings {
        StorageSettings {
            bucket_name: Some("uploads".to_string()),
            is_using_s3: true,
            aws_region: Some("us-east-1".to_string()),
            aws_access_key: Some("AKIDEXAMPLE".to_string()),
            aws_secret_key: Some("secret".to_string()),
            upload_ttl_secs: 60,
            access_ttl_secs: 3600,
            max_upload_mb: 30,
            ..StorageSettings::default()
        }
    }

    #[test]
    fn test_from_settings_s3() {
        let config = StorageConfig::from_settings(&s3_settings()).expect("valid settings");
        assert_eq!(config.backend.name(), "s3");
        assert_eq!(config.bucket, "uploads");
        assert_eq!(config.max_upload_bytes(), 30 * ONE_MB);
    }

    #[test]
    fn test_two_backends_is_configuration_error() {
        let settings = StorageSettings {
            is_using_gcs: true,
            ..s3_settings()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_no_backend_is_unsupported() {
        let settings = StorageSettings {
            is_using_s3: false,
            ..s3_settings()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedBackend));
    }

    #[test]
    fn test_missing_bucket() {
        let settings = StorageSettings {
            bucket_name: Some("  ".to_string()),
            ..s3_settings()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("bucket"));
    }

    #[test]
    fn test_azure_without_key() {
        let settings = StorageSettings {
            bucket_name: Some("uploads".to_string()),
            is_using_azure: true,
            azure_storage_account: Some("relaydev".to_string()),
            ..StorageSettings::default()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
        assert!(err.to_string().contains("Azure storage key"));
    }

    #[test]
    fn test_gcs_key_must_be_base64() {
        let settings = StorageSettings {
            bucket_name: Some("uploads".to_string()),
            is_using_gcs: true,
            gcs_client_email: Some("relay@project.iam.gserviceaccount.com".to_string()),
            gcs_private_key: Some("not base64!".to_string()),
            ..StorageSettings::default()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_endpoint_override() {
        let backend = StorageBackend::azure("relaydev", "a2V5").with_endpoint("http://127.0.0.1:10000");
        let StorageBackend::Azure { endpoint, .. } = backend else {
            panic!("expected azure backend");
        };
        assert_eq!(endpoint.as_deref(), Some("http://127.0.0.1:10000"));
    }
}
