//! Azure Blob Storage: OpenDAL operator for the container, and the raw PUT
//! authorization built from its presigned write request.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use opendal::{Operator, services};

use super::config::StorageConfig;
use super::error::StorageError;
use super::signer::{AuthorizationRequest, Endpoint};
use super::types::{UploadAuthorization, UploadMethod, UploadType};

const BLOB_TYPE: &str = "x-ms-blob-type";

/// Presigning operator for the configured container.
///
/// Without an endpoint override, blobs live under
/// `https://{account}.blob.core.windows.net`.
///
/// # Errors
///
/// Returns `Configuration` if the account key is not base64 or the
/// endpoint override is not a URL.
pub(crate) fn operator(
    config: &StorageConfig,
    account: &str,
    access_key: &str,
    endpoint: Option<&str>,
) -> Result<Operator, StorageError> {
    STANDARD.decode(access_key).map_err(|e| {
        StorageError::configuration(format!("Azure storage key is not base64: {e}"))
    })?;
    let endpoint = match endpoint {
        Some(raw) => {
            let endpoint = Endpoint::parse(raw)?;
            endpoint
                .url(&endpoint.path(&[]), None)
                .trim_end_matches('/')
                .to_string()
        }
        None => format!("https://{account}.blob.core.windows.net"),
    };

    let builder = services::Azblob::default()
        .endpoint(&endpoint)
        .container(&config.bucket)
        .account_name(account)
        .account_key(access_key);

    Ok(Operator::new(builder)
        .map_err(|e| StorageError::configuration(e.to_string()))?
        .finish())
}

/// Raw PUT authorization from a presigned blob write.
///
/// Only `x-ms-*` headers of the presigned request are passed on; the block
/// blob type is always present, plus `Content-Type` when one was requested.
pub(crate) fn upload_authorization<'h>(
    url: String,
    presigned_headers: impl IntoIterator<Item = (&'h str, &'h str)>,
    request: &AuthorizationRequest<'_>,
    expires_at: DateTime<Utc>,
) -> UploadAuthorization {
    let mut headers: BTreeMap<String, String> = presigned_headers
        .into_iter()
        .filter(|(name, _)| name.to_ascii_lowercase().starts_with("x-ms-"))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
        .collect();
    headers
        .entry(BLOB_TYPE.to_string())
        .or_insert_with(|| "BlockBlob".to_string());

    let mut fields = BTreeMap::from([("key".to_string(), request.key.as_str().to_string())]);
    if let Some(content_type) = request.content_type {
        headers.insert("Content-Type".to_string(), content_type.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
    }

    UploadAuthorization {
        method: UploadMethod::Put,
        url,
        headers,
        fields,
        upload_type: UploadType::Raw,
        expires_at: Some(expires_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::StorageBackend;
    use crate::storage::keys::ObjectKey;
    use chrono::TimeZone;

    // Well-known Azurite development key.
    const KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    fn expires_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 1, 0).unwrap()
    }

    #[test]
    fn test_upload_keeps_blob_headers_only() {
        let key = ObjectKey::build(None, None, "abc").expect("key");
        let request = AuthorizationRequest {
            key: &key,
            content_type: Some("text/plain"),
            max_size_mb: 30,
        };
        let url = "http://127.0.0.1:10000/devstoreaccount1/uploads/projects/files/abc?sig=x";
        let auth = upload_authorization(
            url.to_string(),
            [("X-Ms-Version", "2022-11-02"), ("host", "127.0.0.1:10000")],
            &request,
            expires_at(),
        );

        assert_eq!(auth.method, UploadMethod::Put);
        assert_eq!(auth.upload_type, UploadType::Raw);
        assert_eq!(auth.url, url);
        assert_eq!(auth.headers["x-ms-blob-type"], "BlockBlob");
        assert_eq!(auth.headers["x-ms-version"], "2022-11-02");
        assert_eq!(auth.headers["Content-Type"], "text/plain");
        assert!(!auth.headers.contains_key("host"));
        assert_eq!(auth.fields["key"], "projects/files/abc");
        assert_eq!(auth.fields["Content-Type"], "text/plain");
        assert_eq!(auth.expires_at, Some(expires_at()));
    }

    #[test]
    fn test_upload_without_content_type() {
        let key = ObjectKey::build(None, None, "abc").expect("key");
        let request = AuthorizationRequest {
            key: &key,
            content_type: None,
            max_size_mb: 30,
        };
        let auth = upload_authorization(String::new(), std::iter::empty(), &request, expires_at());
        assert_eq!(auth.headers.len(), 1);
        assert!(!auth.fields.contains_key("Content-Type"));
    }

    #[test]
    fn test_key_must_be_base64() {
        let config = StorageConfig::new(StorageBackend::azure("relaydev", "%%%"), "uploads");
        let err = operator(&config, "relaydev", "%%%", None).err();
        assert!(matches!(err, Some(StorageError::Configuration(_))));
    }

    #[test]
    fn test_operator_accepts_azurite_endpoint() {
        let config = StorageConfig::new(StorageBackend::azure("devstoreaccount1", KEY), "uploads");
        let endpoint = Some("http://127.0.0.1:10000/devstoreaccount1");
        assert!(operator(&config, "devstoreaccount1", KEY, endpoint).is_ok());
    }
}
