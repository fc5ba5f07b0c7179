//! Mapping from [`FounderFuelError`] to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use founderfuel_shared::FounderFuelError;

/// JSON error body: `{ error, message, statusCode? }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
    origin_status: Option<u16>,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
            origin_status: None,
        }
    }

    /// The request body did not carry a `url` string.
    pub fn missing_url() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            "Request body must include a 'url' string",
        )
    }
}

impl From<FounderFuelError> for ApiError {
    fn from(err: FounderFuelError) -> Self {
        match &err {
            FounderFuelError::InvalidUrl { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid URL", err.to_string())
            }
            FounderFuelError::Blocked { status, .. } => Self {
                origin_status: Some(*status),
                ..Self::new(StatusCode::FORBIDDEN, "Scraping Blocked", err.to_string())
            },
            FounderFuelError::Fetch { .. } | FounderFuelError::Network(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "Scraping Failed", err.to_string())
            }
            FounderFuelError::Timeout { .. } => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, "Timeout", err.to_string())
            }
            FounderFuelError::Generation(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "Generation Failed", err.to_string())
            }
            FounderFuelError::MalformedResponse { .. } => Self::new(
                StatusCode::BAD_GATEWAY,
                "Malformed Model Response",
                err.to_string(),
            ),
            FounderFuelError::Storage(_)
            | FounderFuelError::Config { .. }
            | FounderFuelError::Io { .. } => {
                error!(error = %err, "unexpected error while handling request");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "An unexpected error occurred",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: self.message,
            status_code: self.origin_status,
        };
        (self.status, Json(body)).into_response()
    }
}
