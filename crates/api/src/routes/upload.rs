//! Upload relay routes.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::{AppState, ApiError};
use relay_core::storage::AuthorizationResponse;
use relay_core::upload::{AuthorizeRequest, UploadInput, UploadResponse};

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/upload-file", post(upload_file))
}

// ============================================================================
// Request Types
// ============================================================================

/// Fields of the `/upload` multipart form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Bytes>,
    file_name: Option<String>,
    file_content_type: Option<String>,
    thread_id: Option<String>,
    project_id: Option<String>,
    mime: Option<String>,
}

impl UploadForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    form.file_name = field.file_name().map(str::to_owned);
                    form.file_content_type = field.content_type().map(str::to_owned);
                    form.file = Some(field.bytes().await?);
                }
                Some("thread_id") => form.thread_id = non_empty(field.text().await?),
                Some("project_id") => form.project_id = non_empty(field.text().await?),
                Some("mime") => form.mime = non_empty(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    /// The `mime` field wins over the file part's own content type.
    fn into_input(self) -> Result<UploadInput, ApiError> {
        let file = self
            .file
            .ok_or_else(|| ApiError::validation("multipart form has no file part"))?;
        Ok(UploadInput {
            bytes: file,
            file_name: self.file_name,
            content_type: self.mime.or(self.file_content_type),
            thread_id: self.thread_id,
            project_id: self.project_id,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/upload`
/// Relay a file to object storage and return its key and read URL.
///
/// Storage round-trip failures return `{"object_key": null, "url": null}`.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let input = UploadForm::read(&mut multipart).await?.into_input()?;

    match state.orchestrator.upload(input).await {
        Ok(outcome) => Ok(Json(outcome.into())),
        Err(e) if e.is_client_error() => {
            warn!(error = %e, "Rejected upload");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Failed to relay upload");
            Err(e.into())
        }
    }
}

/// POST `/upload-file`
/// Issue an upload authorization plus read URL without moving any bytes.
async fn upload_file(
    State(state): State<AppState>,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizationResponse>, ApiError> {
    let content_type = request
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty());

    let authorized = state
        .signing
        .authorize(
            request.project_id.as_deref(),
            request.thread_id.as_deref(),
            &request.file_name,
            content_type,
        )
        .await
        .map_err(|e| {
            error!(error = %e, file_name = %request.file_name, "Failed to authorize upload");
            ApiError::from(e)
        })?;

    info!(
        object_key = %authorized.key,
        backend = state.signing.backend_name(),
        "Upload authorized"
    );
    Ok(Json(authorized.into()))
}
