//! API error envelope
//!
//! User-visible failures always render as JSON `{status, message}` with an
//! HTTP status matching the underlying cause. A `traceback` field is added
//! when the request carried an `X-Debug` header.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// The caller got the request wrong (e.g. missing token)
    BadRequest(String),

    /// The manager answered with a non-success status; propagated verbatim
    Status { code: u16, message: String },

    /// No reply or a transport failure behind the API
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Status { code, .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the JSON envelope, with a traceback for X-Debug callers.
    pub fn into_envelope(self, debug: bool) -> Response {
        let status = self.status_code();

        if let ApiError::Internal(message) = &self {
            tracing::error!(message = %message, "internal api error");
        }

        let message = match self {
            ApiError::BadRequest(message) => message,
            ApiError::Status { message, .. } => message,
            ApiError::Internal(message) => message,
        };

        let mut body = serde_json::json!({
            "status": status.as_u16(),
            "message": message,
        });

        if debug {
            body["traceback"] = serde_json::Value::String(
                std::backtrace::Backtrace::force_capture().to_string(),
            );
        }

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_envelope(false)
    }
}
