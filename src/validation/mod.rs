//! Validation helpers for `issue_tracker`.
//!
//! These routines turn raw client payloads into typed inputs and return
//! structured errors without touching storage.

mod update;

pub use update::{NormalizedUpdate, UpdateNormalizer};

use crate::error::{Result, TrackerError};
use crate::model::{IssueField, NewIssue, RawPayload};

/// Validates creation payloads.
pub struct IssueValidator;

impl IssueValidator {
    /// Check required fields and build the creation input.
    ///
    /// `issue_title`, `issue_text` and `created_by` must be present and
    /// non-empty. Optional text fields default to the empty string. Every
    /// other key (including `open`, `_id` and timestamps) is ignored.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredFields` naming every missing field.
    pub fn validate_new(project: &str, payload: &RawPayload) -> Result<NewIssue> {
        let missing: Vec<String> = IssueField::REQUIRED
            .iter()
            .filter(|field| payload.non_empty(field.as_str()).is_none())
            .map(|field| field.as_str().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(TrackerError::MissingRequiredFields { fields: missing });
        }

        let text = |field: IssueField| {
            payload
                .non_empty(field.as_str())
                .unwrap_or_default()
                .to_string()
        };

        Ok(NewIssue {
            project: project.to_string(),
            issue_title: text(IssueField::IssueTitle),
            issue_text: text(IssueField::IssueText),
            created_by: text(IssueField::CreatedBy),
            assigned_to: text(IssueField::AssignedTo),
            status_text: text(IssueField::StatusText),
        })
    }
}
