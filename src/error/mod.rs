//! Error types and handling for `issue_tracker`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Expected request conditions (missing `_id`, unknown record, ...) are
//!   ordinary variants; the HTTP layer turns them into 200-level payloads
//! - Lower-layer failures (`SQLite`, I/O, a poisoned connection) are the
//!   only variants that surface as server errors
//! - `anyhow` is accepted for startup plumbing in the binary

mod structured;

pub use structured::{ErrorCode, StructuredError};

use thiserror::Error;

/// Primary error type for `issue_tracker` operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Request Errors ===
    /// One or more of `issue_title`, `issue_text`, `created_by` is absent or empty.
    #[error("required field(s) missing: {}", fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    /// Update or delete payload carried no `_id`.
    #[error("missing _id")]
    MissingId,

    /// `_id` is not a well-formed store key.
    #[error("Invalid issue ID format: {id}")]
    InvalidId { id: String },

    /// Well-formed `_id` with no stored record.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    /// Update payload carried `_id` but nothing to change.
    #[error("no update field(s) sent for {id}")]
    NoUpdateFields { id: String },

    /// Request body could not be decoded.
    #[error("Invalid request body: {reason}")]
    InvalidPayload { reason: String },

    // === Storage Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store could not be reached (poisoned lock, lost worker).
    #[error("Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    // === Configuration Errors ===
    /// Configuration value could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackerError {
    /// Is this a condition the client caused and can fix?
    ///
    /// These are answered with a structured payload instead of an error status.
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredFields { .. }
                | Self::MissingId
                | Self::InvalidId { .. }
                | Self::IssueNotFound { .. }
                | Self::NoUpdateFields { .. }
        )
    }

    /// The `_id` the client sent, when the error is tied to one.
    #[must_use]
    pub fn issue_id(&self) -> Option<&str> {
        match self {
            Self::InvalidId { id } | Self::IssueNotFound { id } | Self::NoUpdateFields { id } => {
                Some(id)
            }
            _ => None,
        }
    }

    /// Create a store-unavailable error with a reason.
    #[must_use]
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }
}

/// Result type using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::IssueNotFound {
            id: "5f1d7f3e2a9b4c0d1e2f3a4b".to_string(),
        };
        assert_eq!(err.to_string(), "Issue not found: 5f1d7f3e2a9b4c0d1e2f3a4b");

        let err = TrackerError::MissingRequiredFields {
            fields: vec!["issue_text".to_string(), "created_by".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "required field(s) missing: issue_text, created_by"
        );
    }

    #[test]
    fn test_user_recoverable() {
        assert!(TrackerError::MissingId.is_user_recoverable());
        assert!(
            TrackerError::NoUpdateFields {
                id: "abc".to_string()
            }
            .is_user_recoverable()
        );

        let not_recoverable = TrackerError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            None,
        ));
        assert!(!not_recoverable.is_user_recoverable());
        assert!(!TrackerError::store_unavailable("lock poisoned").is_user_recoverable());
    }

    #[test]
    fn test_issue_id_carried() {
        let err = TrackerError::InvalidId {
            id: "nope".to_string(),
        };
        assert_eq!(err.issue_id(), Some("nope"));
        assert_eq!(TrackerError::MissingId.issue_id(), None);
    }
}
