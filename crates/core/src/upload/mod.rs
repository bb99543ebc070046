//! Two-phase upload relay.
//!
//! This module provides the byte-carrying half of the relay:
//! - Upload authorization, in-process or from a remote signer
//! - Execution of the authorized raw or multipart request
//! - Reconciliation into an all-or-nothing `{object_key, url}` result

mod error;
mod orchestrator;
mod source;
mod types;

pub use error::UploadError;
pub use orchestrator::{UploadOrchestrator, http_client};
pub use source::{
    AuthorizationOutcome, AuthorizationSource, AuthorizeRequest, Authorizer, HttpAuthorizer,
    SigningAuthorizer,
};
pub use types::{
    DEFAULT_CONTENT_TYPE, GrantedUpload, UploadFailure, UploadInput, UploadOutcome, UploadResponse,
};
