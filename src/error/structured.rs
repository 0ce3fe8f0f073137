//! Structured error payloads for API clients.
//!
//! Every failure a handler can produce is folded into a `StructuredError`:
//! - a stable `ErrorCode`
//! - the exact wire message clients match on (`"missing _id"`, ...)
//! - the `_id` the client sent, when there is one
//! - the HTTP status class the error belongs to
//!
//! Malformed and unknown identifiers deliberately collapse into the same
//! `could not update` / `could not delete` signal.

use crate::api::Operation;
use crate::error::TrackerError;
use serde_json::{Map, Value};

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // === Request errors (answered with 200) ===
    /// Create without `issue_title`, `issue_text` or `created_by`
    RequiredField,
    /// Update or delete without `_id`
    MissingId,
    /// Update with nothing to change
    NoUpdateFields,
    /// Update against a malformed or unknown `_id`
    CouldNotUpdate,
    /// Delete against a malformed or unknown `_id`
    CouldNotDelete,

    // === Transport errors (400, 413) ===
    /// Body was neither JSON nor a form
    InvalidPayload,
    /// Body exceeded the request size limit (413)
    PayloadTooLarge,

    // === Server errors (500) ===
    /// Store failure
    StoreUnavailable,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredField => "REQUIRED_FIELD",
            Self::MissingId => "MISSING_ID",
            Self::NoUpdateFields => "NO_UPDATE_FIELDS",
            Self::CouldNotUpdate => "COULD_NOT_UPDATE",
            Self::CouldNotDelete => "COULD_NOT_DELETE",
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// The message clients see in the `error` field.
    #[must_use]
    pub const fn wire_message(&self) -> &'static str {
        match self {
            Self::RequiredField => "required field(s) missing",
            Self::MissingId => "missing _id",
            Self::NoUpdateFields => "no update field(s) sent",
            Self::CouldNotUpdate => "could not update",
            Self::CouldNotDelete => "could not delete",
            Self::InvalidPayload => "invalid request body",
            Self::PayloadTooLarge => "request body too large",
            Self::StoreUnavailable => "store unavailable",
            Self::InternalError => "internal error",
        }
    }

    /// HTTP status for this error category.
    ///
    /// - 200: expected request conditions, reported in the body
    /// - 400: undecodable request body
    /// - 413: request body over the size limit
    /// - 500: store or internal failure
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::RequiredField
            | Self::MissingId
            | Self::NoUpdateFields
            | Self::CouldNotUpdate
            | Self::CouldNotDelete => 200,
            Self::InvalidPayload => 400,
            Self::PayloadTooLarge => 413,
            Self::StoreUnavailable | Self::InternalError => 500,
        }
    }

    /// Whether this is an expected, client-facing condition.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        self.http_status() < 400
    }
}

/// Structured error ready to be rendered as a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// `_id` echoed back to the client
    pub id: Option<String>,
    /// Full error text, for logs only
    pub detail: String,
}

impl StructuredError {
    /// Classify a `TrackerError` raised while running `op`.
    #[must_use]
    pub fn from_error(err: &TrackerError, op: Operation) -> Self {
        let code = match err {
            TrackerError::MissingRequiredFields { .. } => ErrorCode::RequiredField,
            TrackerError::MissingId => ErrorCode::MissingId,
            TrackerError::NoUpdateFields { .. } => ErrorCode::NoUpdateFields,
            TrackerError::InvalidId { .. } | TrackerError::IssueNotFound { .. } => {
                if op == Operation::Delete {
                    ErrorCode::CouldNotDelete
                } else {
                    ErrorCode::CouldNotUpdate
                }
            }
            TrackerError::InvalidPayload { .. } => ErrorCode::InvalidPayload,
            TrackerError::Database(_)
            | TrackerError::StoreUnavailable { .. }
            | TrackerError::Io(_) => ErrorCode::StoreUnavailable,
            TrackerError::Config(_)
            | TrackerError::Json(_)
            | TrackerError::Yaml(_)
            | TrackerError::Other(_) => ErrorCode::InternalError,
        };

        Self {
            code,
            id: err.issue_id().map(str::to_string),
            detail: err.to_string(),
        }
    }

    /// Render the response body: `{"error": ..., "_id": ...}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "error".to_string(),
            Value::String(self.code.wire_message().to_string()),
        );
        if let Some(id) = &self.id {
            body.insert("_id".to_string(), Value::String(id.clone()));
        }
        Value::Object(body)
    }
}
