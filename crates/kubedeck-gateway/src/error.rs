//! API error types and responses.
//!
//! Every failure leaves the gateway as `{"error": {"code", "message"}}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use kubedeck_facade::FacadeError;
use kubedeck_telemetry::TelemetryError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field was missing or blank.
    #[error("incomplete arguments")]
    IncompleteArguments,

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The cluster credential was missing or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested object was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The cluster returned an object of unexpected shape.
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    /// The cluster or a node agent failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::IncompleteArguments | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::IncompleteArguments => "incomplete_arguments",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Unprocessable(_) => "unprocessable",
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FacadeError> for ApiError {
    fn from(err: FacadeError) -> Self {
        match err {
            FacadeError::Auth(msg) => Self::Unauthorized(msg),
            FacadeError::NotFound(msg) => Self::NotFound(msg),
            FacadeError::InvalidArguments(_)
            | FacadeError::UnknownOperation(_)
            | FacadeError::InvalidImage(_) => Self::BadRequest(err.to_string()),
            FacadeError::InvalidObject(msg) => Self::Unprocessable(msg),
            FacadeError::Remote(_) | FacadeError::Exec(_) => {
                tracing::error!(error = %err, "Cluster call failed");
                Self::Upstream(err.to_string())
            }
            FacadeError::Io(_) => {
                tracing::error!(error = %err, "Local I/O error");
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(err: TelemetryError) -> Self {
        match err {
            TelemetryError::Facade(facade_err) => Self::from(facade_err),
            TelemetryError::Probe { .. } | TelemetryError::PartialOutage { .. } => {
                Self::Upstream(err.to_string())
            }
            TelemetryError::Client(msg) => {
                tracing::error!(error = %msg, "Telemetry client error");
                Self::Internal(msg)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                tracing::debug!(error = %e, "Request body missing fields");
                Self::IncompleteArguments
            }
            other => Self::BadRequest(other.body_text()),
        }
    }
}
