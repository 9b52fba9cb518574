//! HTTP request handlers.
//!
//! Successful cluster calls answer `{"success": true, "data": ...}`.

pub mod deployments;
pub mod health;
pub mod manage;
pub mod statistics;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;

/// Success envelope shared by every cluster route.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// Route-specific payload.
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` in a success envelope.
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Unwrap a JSON body, mapping missing fields to incomplete arguments.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

/// Fail unless every field is non-blank.
pub(crate) fn require(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        Err(ApiError::IncompleteArguments)
    } else {
        Ok(())
    }
}
