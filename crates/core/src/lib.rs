//! Storage signing and upload orchestration for the relay.
//!
//! This crate contains the provider-independent core with ZERO web framework
//! dependencies.
//!
//! # Modules
//!
//! - `storage` - Upload authorizations and signed access URLs for S3, GCS and Azure
//! - `upload` - Two-phase upload orchestration (authorize, then execute)

pub mod storage;
pub mod upload;
