//! Shared errors and configuration for the upload relay.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management (server, storage backend selection, upload tuning)

pub mod config;
pub mod error;

pub use config::{AppConfig, ServerConfig, StorageSettings, UploadSettings};
pub use error::AppError;
