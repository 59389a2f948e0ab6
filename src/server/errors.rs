//! Translation of domain errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::ingest::IngestError;
use crate::song::SongStoreError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn internal_error(err: &dyn std::fmt::Display) -> Response {
    error!("Internal error: {}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl IntoResponse for SongStoreError {
    fn into_response(self) -> Response {
        match self {
            SongStoreError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            SongStoreError::CreateConflict(_) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            SongStoreError::Database(ref err) => internal_error(err),
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match self {
            IngestError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestError::MissingFile | IngestError::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            IngestError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            IngestError::Conflict(_) => StatusCode::CONFLICT,
            IngestError::Internal(ref err) => return internal_error(err),
        };
        error_response(status, self.to_string())
    }
}
