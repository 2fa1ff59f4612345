//! Error handling

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::classifier::ClassifierError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No image file provided")]
    MissingImage,

    #[error("Image exceeds the maximum upload size")]
    PayloadTooLarge,

    #[error("{0}")]
    Classification(#[from] ClassifierError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Classification(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A multipart body that cannot be read carries no usable image; only an
/// oversized body is reported differently.
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            log::debug!("Unreadable multipart body: {}", err.body_text());
            ApiError::MissingImage
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Vision error: {}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
