//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Upload relay configuration.
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Raw storage settings as they appear in the environment.
///
/// Exactly one of the `is_using_*` selectors must be set. The settings are
/// validated into a typed backend by `relay_core::storage::StorageConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Bucket (S3, GCS) or container (Azure) name.
    pub bucket_name: Option<String>,
    /// Select the S3-compatible backend.
    #[serde(default)]
    pub is_using_s3: bool,
    /// Select the Google Cloud Storage backend.
    #[serde(default)]
    pub is_using_gcs: bool,
    /// Select the Azure Blob Storage backend.
    #[serde(default)]
    pub is_using_azure: bool,

    /// AWS region.
    pub aws_region: Option<String>,
    /// AWS access key ID.
    pub aws_access_key: Option<String>,
    /// AWS secret access key.
    pub aws_secret_key: Option<String>,
    /// Endpoint override for S3-compatible dev servers (MinIO, LocalStack).
    pub dev_aws_endpoint: Option<String>,

    /// GCP project ID.
    pub gcs_project_id: Option<String>,
    /// Service account email.
    pub gcs_client_email: Option<String>,
    /// Base64-encoded PEM private key of the service account.
    pub gcs_private_key: Option<String>,

    /// Azure storage account name.
    pub azure_storage_account: Option<String>,
    /// Azure storage account key (base64).
    pub azure_storage_key: Option<String>,
    /// Endpoint override for the Azure blob service (Azurite).
    pub dev_azure_endpoint: Option<String>,

    /// Upload authorization TTL in seconds.
    #[serde(default = "default_upload_ttl")]
    pub upload_ttl_secs: u64,
    /// Signed access URL TTL in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket_name: None,
            is_using_s3: false,
            is_using_gcs: false,
            is_using_azure: false,
            aws_region: None,
            aws_access_key: None,
            aws_secret_key: None,
            dev_aws_endpoint: None,
            gcs_project_id: None,
            gcs_client_email: None,
            gcs_private_key: None,
            azure_storage_account: None,
            azure_storage_key: None,
            dev_azure_endpoint: None,
            upload_ttl_secs: default_upload_ttl(),
            access_ttl_secs: default_access_ttl(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_upload_ttl() -> u64 {
    60
}

fn default_access_ttl() -> u64 {
    3600 // 1 hour
}

fn default_max_upload_mb() -> u64 {
    30
}

/// Upload relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Timeout for each outbound request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Base URL of a remote authorization service.
    ///
    /// When unset, authorizations are minted in-process.
    pub authorizer_url: Option<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            authorizer_url: None,
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("RELAY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
