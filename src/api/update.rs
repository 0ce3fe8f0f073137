//! Update handler.
//!
//! Order of checks matters to clients:
//! 1. `missing _id`
//! 2. `no update field(s) sent`
//! 3. malformed `_id` (no store lookup)
//! 4. unknown `_id`
//!
//! 3 and 4 both surface as `could not update`.

use crate::api::Confirmation;
use crate::error::{Result, TrackerError};
use crate::model::{IssueId, RawPayload};
use crate::storage::IssueStore;
use crate::validation::{NormalizedUpdate, UpdateNormalizer};
use tracing::{debug, info};

/// Apply a partial update from `payload`.
///
/// Lookup is by identifier alone; `project` only scopes the route.
///
/// # Errors
///
/// - `MissingId`, `NoUpdateFields` from normalization
/// - `InvalidId` if `_id` is not a store key
/// - `IssueNotFound` if no record has that `_id`
/// - storage errors
pub fn execute(store: &dyn IssueStore, project: &str, payload: &RawPayload) -> Result<Confirmation> {
    let NormalizedUpdate { id: raw_id, update } = UpdateNormalizer::normalize(payload)?;
    let id = IssueId::parse(&raw_id)?;

    debug!(project, id = %id, fields = update.changes.len(), "Applying update");
    let updated = store
        .update_by_id(&id, &update)?
        .ok_or(TrackerError::IssueNotFound { id: raw_id })?;

    info!(project, id = %updated.id, "Updated issue");
    Ok(Confirmation::updated(updated.id))
}
