//! Form signer interface and the signing primitives behind the S3 POST
//! policy and the GCS signed POST URL.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use url::Url;

use super::error::StorageError;
use super::keys::ObjectKey;
use super::types::UploadAuthorization;

/// Parameters for minting an upload authorization.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    /// Destination key and the prefix it must stay under.
    pub key: &'a ObjectKey,
    /// Content type to bind, if any.
    pub content_type: Option<&'a str>,
    /// Upper bound on the object size in megabytes.
    pub max_size_mb: u64,
}

/// A backend whose upload authorization is a browser-style form POST,
/// signed locally without a presigned request.
///
/// Implementations are immutable after construction and safe to share
/// across requests.
pub trait FormSigner: Send + Sync {
    /// Mint a short-lived write authorization for `request.key`.
    fn upload_authorization(
        &self,
        request: &AuthorizationRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<UploadAuthorization, StorageError>;
}

/// RFC 3986 unreserved characters stay literal, everything else is encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Same as [`UNRESERVED`] but keeps path separators.
const PATH: &AsciiSet = &UNRESERVED.remove(b'/');

/// Percent-encode a query component.
pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Percent-encode an object path, keeping `/`.
pub(crate) fn encode_path(value: &str) -> String {
    utf8_percent_encode(value, PATH).to_string()
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StorageError::signing(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `now + secs`, failing instead of overflowing.
pub(crate) fn expiry(now: DateTime<Utc>, secs: u64) -> Result<DateTime<Utc>, StorageError> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| StorageError::configuration(format!("TTL of {secs}s is out of range")))
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Parsed service endpoint: scheme, authority and base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    scheme: String,
    host: String,
    base_path: String,
}

impl Endpoint {
    pub(crate) fn parse(raw: &str) -> Result<Self, StorageError> {
        let url = Url::parse(raw)
            .map_err(|e| StorageError::configuration(format!("invalid endpoint {raw}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| StorageError::configuration(format!("endpoint {raw} has no host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn https(host: impl Into<String>) -> Self {
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            base_path: String::new(),
        }
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    /// Encoded absolute path for `segments` joined under the base path.
    pub(crate) fn path(&self, segments: &[&str]) -> String {
        let mut path = self.base_path.clone();
        for segment in segments {
            path.push('/');
            path.push_str(&encode_path(segment));
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }

    pub(crate) fn url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("{}://{}{path}?{query}", self.scheme, self.host),
            None => format!("{}://{}{path}", self.scheme, self.host),
        }
    }
}

/// Canonical request for GCS V4 query signing.
#[derive(Debug)]
pub(crate) struct CanonicalRequest<'a> {
    pub method: &'a str,
    /// Already-encoded path.
    pub path: &'a str,
    /// Unencoded query pairs, including the signed-headers parameter.
    pub query: Vec<(String, String)>,
    /// Lowercase header names with their values.
    pub headers: Vec<(String, String)>,
}

impl CanonicalRequest<'_> {
    /// Semicolon-joined sorted header names.
    pub(crate) fn signed_headers(headers: &[(String, String)]) -> String {
        let mut names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable();
        names.join(";")
    }

    pub(crate) fn canonical_query(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .query
            .iter()
            .map(|(k, v)| (encode_component(k), encode_component(v)))
            .collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub(crate) fn canonical_string(&self) -> String {
        let mut headers = self.headers.clone();
        headers.sort();
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{}\n", value.trim()))
            .collect();
        format!(
            "{}\n{}\n{}\n{}\n{}\nUNSIGNED-PAYLOAD",
            self.method,
            self.path,
            self.canonical_query(),
            canonical_headers,
            Self::signed_headers(&self.headers),
        )
    }

    /// Hex SHA-256 of the canonical request, the last line of the string to sign.
    pub(crate) fn hashed(&self) -> String {
        sha256_hex(self.canonical_string().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a b/c~d"), "a%20b%2Fc~d");
        assert_eq!(
            encode_component("AKID/20130524/us-east-1/s3/aws4_request"),
            "AKID%2F20130524%2Fus-east-1%2Fs3%2Faws4_request"
        );
    }

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("projects/p 1/files"), "projects/p%201/files");
    }

    #[test]
    fn test_endpoint_parse_with_port_and_base() {
        let endpoint = Endpoint::parse("http://127.0.0.1:10000/devstoreaccount1/").expect("valid");
        assert_eq!(endpoint.host(), "127.0.0.1:10000");
        assert_eq!(
            endpoint.path(&["uploads", "projects/files/abc"]),
            "/devstoreaccount1/uploads/projects/files/abc"
        );
    }

    #[test]
    fn test_endpoint_root_path() {
        let endpoint = Endpoint::https("bucket.s3.us-east-1.amazonaws.com");
        assert_eq!(endpoint.path(&[]), "/");
        assert_eq!(
            endpoint.url("/", None),
            "https://bucket.s3.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(Endpoint::parse("not a url").is_err());
    }

    #[test]
    fn test_canonical_request_layout() {
        let headers = vec![("host".to_string(), "example.com".to_string())];
        let request = CanonicalRequest {
            method: "GET",
            path: "/a",
            query: vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1 1".to_string()),
            ],
            headers,
        };
        assert_eq!(
            request.canonical_string(),
            "GET\n/a\na=1%201&b=2\nhost:example.com\n\nhost\nUNSIGNED-PAYLOAD"
        );
    }
}
