//! Error responses.

use crate::api::Operation;
use crate::error::{ErrorCode, StructuredError, TrackerError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

/// A handler failure, rendered as `{"error": ..., "_id"?: ...}`.
///
/// Expected request conditions keep status 200 so clients read the body;
/// only rejected bodies (400, 413) and store failures (500) change the status.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    error: StructuredError,
}

impl ApiFailure {
    /// Classify `err` raised by `op` and log it at the matching level.
    #[must_use]
    pub fn new(err: &TrackerError, op: Operation) -> Self {
        let error = StructuredError::from_error(err, op);
        if error.code.is_expected() {
            debug!(%op, code = error.code.as_str(), detail = %error.detail, "Request rejected");
        } else {
            error!(%op, code = error.code.as_str(), detail = %error.detail, "Request failed");
        }
        Self { error }
    }

    /// The body could not be decoded.
    #[must_use]
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::rejected_body(ErrorCode::InvalidPayload, reason.into())
    }

    /// The body exceeded the request size limit.
    #[must_use]
    pub fn payload_too_large(reason: impl Into<String>) -> Self {
        Self::rejected_body(ErrorCode::PayloadTooLarge, reason.into())
    }

    fn rejected_body(code: ErrorCode, detail: String) -> Self {
        debug!(code = code.as_str(), detail = %detail, "Request body rejected");
        Self {
            error: StructuredError {
                code,
                id: None,
                detail,
            },
        }
    }

    #[must_use]
    pub const fn structured(&self) -> &StructuredError {
        &self.error
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status(), Json(self.error.to_json())).into_response()
    }
}
