//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - `POST /upload` relaying a multipart file to object storage
//! - `POST /upload-file` issuing upload authorizations
//! - `GET /health`
//! - Error-to-response mapping

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use relay_core::storage::{ONE_MB, SigningService};
use relay_core::upload::UploadOrchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Signing service for the configured backend.
    pub signing: Arc<SigningService>,
    /// Upload relay.
    pub orchestrator: Arc<UploadOrchestrator>,
}

impl AppState {
    /// Largest accepted request body: the upload limit plus form overhead.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        let bytes = self
            .signing
            .max_upload_mb()
            .saturating_add(1)
            .saturating_mul(ONE_MB);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit();
    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
