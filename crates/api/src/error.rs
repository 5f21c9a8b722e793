//! Error-to-response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use mangavault_pipeline::PipelineError;

/// An error response: a status code plus a stable message body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Map a pipeline error: not-found keeps its own message as a 404,
    /// everything else is logged and served as a 500 with the stable
    /// per-operation message.
    pub fn from_pipeline(err: PipelineError, operation_failed: &'static str) -> Self {
        if err.is_not_found() {
            return Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            };
        }
        error!(%err, "{operation_failed}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: operation_failed.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
