//! HTTP-facing errors for Planpal
//!
//! Only the webhook surface returns `Error`. Errors raised while processing a
//! conversation are reported to the failure sink and answered with a fixed
//! reply instead, so they never become an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or wrong webhook secret token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Body is not a Telegram update
    #[error("Malformed update: {0}")]
    MalformedUpdate(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::MalformedUpdate(_) => StatusCode::BAD_REQUEST,
            Error::Internal(_) | Error::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::MalformedUpdate(_) => "MALFORMED_UPDATE",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Details of server-side failures stay in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Webhook request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "Webhook request rejected");
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
