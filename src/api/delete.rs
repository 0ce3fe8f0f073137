//! Delete handler. Deletion is a hard delete.

use crate::api::Confirmation;
use crate::error::{Result, TrackerError};
use crate::model::{ID_KEY, IssueId, RawPayload};
use crate::storage::IssueStore;
use tracing::info;

/// Delete the issue named by `_id` in `payload`.
///
/// # Errors
///
/// - `MissingId` if `_id` is absent or empty
/// - `InvalidId` if `_id` is not a store key
/// - `IssueNotFound` if no record has that `_id`
/// - storage errors
pub fn execute(store: &dyn IssueStore, project: &str, payload: &RawPayload) -> Result<Confirmation> {
    let raw_id = payload.non_empty(ID_KEY).ok_or(TrackerError::MissingId)?;
    let id = IssueId::parse(raw_id)?;

    let removed = store
        .delete_by_id(&id)?
        .ok_or_else(|| TrackerError::IssueNotFound {
            id: raw_id.to_string(),
        })?;

    info!(project, id = %removed.id, "Deleted issue");
    Ok(Confirmation::deleted(removed.id))
}
