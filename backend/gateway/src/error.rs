//! API error responses.
//!
//! Every failure leaves the gateway as `{"error": <code>, "message": <text>}`
//! with a matching status code.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use logging::redact_sensitive_data;
use picscribe_core::PicscribeError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }
}

impl From<PicscribeError> for ApiError {
    fn from(err: PicscribeError) -> Self {
        let (status, code) = match &err {
            PicscribeError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            PicscribeError::RowNotFound(_) => (StatusCode::NOT_FOUND, "row_not_found"),
            PicscribeError::DuplicateImageId(_) => (StatusCode::BAD_REQUEST, "duplicate_image_id"),
            PicscribeError::InvalidPrompt(_) => (StatusCode::BAD_REQUEST, "invalid_prompt"),
            PicscribeError::InvalidDataUri(_) => (StatusCode::BAD_REQUEST, "invalid_data_uri"),
            PicscribeError::Vision { .. } => (StatusCode::BAD_GATEWAY, "vision_error"),
            PicscribeError::Io(_) | PicscribeError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        Self::new(status, code, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "upload_too_large"
        } else {
            "invalid_upload"
        };
        Self::new(status, code, err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), "invalid_upload", rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(status, "body_too_large", rejection.body_text());
        }
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), "invalid_path", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = redact_sensitive_data(&self.message);
        if self.status.is_server_error() {
            error!(code = self.code, message = %message, "Request failed");
        }
        (
            self.status,
            Json(json!({ "error": self.code, "message": message })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
