//! Error-to-response mapping.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_core::storage::StorageError;
use relay_core::upload::UploadError;
use relay_shared::AppError;
use serde_json::json;

/// Error returned by route handlers, rendered as `{"error", "message"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Missing or malformed request input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            status: StatusCode::from_u16(error.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code: error.error_code(),
            message: error.to_string(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match &error {
            StorageError::InvalidKey(_) => AppError::Validation(error.to_string()),
            _ => AppError::Storage(error.to_string()),
        }
        .into()
    }
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::InvalidAuthorization(msg) => AppError::InvalidAuthorization(msg).into(),
            UploadError::InvalidContentType(ct) => {
                AppError::Validation(format!("invalid content type: {ct}")).into()
            }
            UploadError::Storage(err) => err.into(),
            UploadError::Internal(msg) => AppError::Internal(msg).into(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        Self {
            status: error.status(),
            code: "INVALID_MULTIPART",
            message: error.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UploadError::invalid_authorization("no url"), StatusCode::BAD_REQUEST, "INVALID_AUTHORIZATION")]
    #[case(UploadError::InvalidContentType("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case(UploadError::Storage(StorageError::invalid_key("..")), StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case(UploadError::Storage(StorageError::signing("rsa")), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")]
    #[case(UploadError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
    fn test_upload_error_mapping(
        #[case] error: UploadError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let api = ApiError::from(error);
        assert_eq!(api.status(), status);
        assert_eq!(api.code, code);
    }

    #[test]
    fn test_message_is_kept() {
        let api = ApiError::from(UploadError::internal("client build failed"));
        assert!(api.message.contains("client build failed"));
    }
}
