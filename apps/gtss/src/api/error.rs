//! # API Errors
//!
//! Maps core errors and request rejections to HTTP responses.
//!
//! | Error | Status |
//! |---|---|
//! | `Validation`, `NotFound`, malformed JSON | 400 |
//! | absent record on single-record GET | 404 |
//! | everything else | 500 |
//!
//! Every error body is `{"message": "..."}`.

use super::types::ErrorResponse;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gtss_core::{EntityKind, GtssError};

/// Error returned by every fallible handler.
#[derive(Debug)]
pub enum ApiError {
    /// An error raised by the record store or export pipeline.
    Core(GtssError),
    /// A request body that could not be decoded.
    BadRequest(String),
    /// A single-record GET for a key that does not exist.
    Missing(EntityKind, String),
}

impl From<GtssError> for ApiError {
    fn from(e: GtssError) -> Self {
        Self::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Missing(..) => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Core(e) => e.to_string(),
            Self::BadRequest(reason) => format!("Invalid request body: {reason}"),
            Self::Missing(entity, key) => GtssError::not_found(*entity, key.clone()).to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", message);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", message);
        }

        (status, Json(ErrorResponse { message })).into_response()
    }
}
