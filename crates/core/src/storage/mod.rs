//! Object storage signing for S3, Google Cloud Storage and Azure Blob Storage.
//!
//! Each backend grants write access through a different primitive:
//!
//! ```text
//! ┌─────────┬──────────────────────────────┬─────────────┐
//! │ Backend │ Upload authorization         │ Upload type │
//! ├─────────┼──────────────────────────────┼─────────────┤
//! │ S3      │ SigV4 POST policy + fields   │ multipart   │
//! │ GCS     │ V4 signed POST URL + fields  │ multipart   │
//! │ Azure   │ op.presign_write + headers   │ raw         │
//! └─────────┴──────────────────────────────┴─────────────┘
//! ```
//!
//! Access URLs on every backend come from the OpenDAL operator
//! (`op.presign_read` / `op.presign_write`).
//!
//! [`SigningService`] hides the difference behind [`UploadAuthorization`].

mod azure;
mod config;
mod error;
mod gcs;
mod keys;
mod s3;
mod service;
mod signer;
mod types;

pub use config::{ONE_MB, StorageBackend, StorageConfig};
pub use error::StorageError;
pub use gcs::GcsSigner;
pub use keys::ObjectKey;
pub use s3::{PolicyCondition, PostPolicy, S3Signer};
pub use service::{AuthorizedUpload, SigningService};
pub use signer::{AuthorizationRequest, FormSigner};
pub use types::{
    AccessAction, AuthorizationPayload, AuthorizationResponse, SignedAccessUrl,
    UploadAuthorization, UploadMethod, UploadType,
};
