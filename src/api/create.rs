//! Create handler.

use crate::error::Result;
use crate::model::{Issue, RawPayload};
use crate::storage::IssueStore;
use crate::validation::IssueValidator;
use tracing::info;

/// Validate `payload` and persist a new issue under `project`.
///
/// Nothing is written when validation fails.
///
/// # Errors
///
/// Returns `MissingRequiredFields` if any required field is absent or empty,
/// or a storage error.
pub fn execute(store: &dyn IssueStore, project: &str, payload: &RawPayload) -> Result<Issue> {
    let new = IssueValidator::validate_new(project, payload)?;
    let issue = store.insert(new)?;
    info!(project, id = %issue.id, "Created issue");
    Ok(issue)
}
