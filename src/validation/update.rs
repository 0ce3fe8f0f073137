//! Partial-update normalization.
//!
//! Turns a raw PUT payload into a closed, typed set of field changes:
//!
//! 1. `_id` must be present and non-empty.
//! 2. A key is admitted only if it names a mutable field and its value is
//!    non-empty. An empty value means "leave unchanged", never "clear".
//! 3. At least one key must be admitted.
//! 4. `open` is coerced: `"false"` is false, any other non-empty string is true.
//! 5. `updated_on` is stamped with the current time.
//!
//! The identifier is only checked for presence here; its shape is checked
//! by the caller so that "no update field(s) sent" wins over a malformed id.

use crate::error::{Result, TrackerError};
use crate::model::{FieldChange, ID_KEY, IssueField, IssueUpdate, RawPayload};
use crate::util::time;
use chrono::{DateTime, Utc};
use tracing::trace;

/// Output of a successful normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUpdate {
    /// `_id` exactly as the client sent it.
    pub id: String,
    pub update: IssueUpdate,
}

/// Normalizes update payloads.
pub struct UpdateNormalizer;

impl UpdateNormalizer {
    /// Normalize `payload`, stamping the current time.
    ///
    /// # Errors
    ///
    /// - `MissingId` if `_id` is absent or empty
    /// - `NoUpdateFields` if no mutable field carries a value
    pub fn normalize(payload: &RawPayload) -> Result<NormalizedUpdate> {
        Self::normalize_at(payload, time::now())
    }

    /// Normalize `payload` with an explicit `updated_on`.
    ///
    /// # Errors
    ///
    /// Same as [`UpdateNormalizer::normalize`].
    pub fn normalize_at(payload: &RawPayload, now: DateTime<Utc>) -> Result<NormalizedUpdate> {
        let id = payload
            .non_empty(ID_KEY)
            .ok_or(TrackerError::MissingId)?
            .to_string();

        let mut changes = Vec::new();
        for (key, value) in payload.iter() {
            if key == ID_KEY || value.is_empty() {
                continue;
            }
            let Some(field) = IssueField::from_key(key) else {
                trace!(field = %key, "Ignoring non-mutable update key");
                continue;
            };
            changes.push(coerce(field, value));
        }

        if changes.is_empty() {
            return Err(TrackerError::NoUpdateFields { id });
        }

        Ok(NormalizedUpdate {
            id,
            update: IssueUpdate {
                changes,
                updated_on: now,
            },
        })
    }
}

fn coerce(field: IssueField, value: &str) -> FieldChange {
    let text = value.to_string();
    match field {
        IssueField::IssueTitle => FieldChange::IssueTitle(text),
        IssueField::IssueText => FieldChange::IssueText(text),
        IssueField::CreatedBy => FieldChange::CreatedBy(text),
        IssueField::AssignedTo => FieldChange::AssignedTo(text),
        IssueField::StatusText => FieldChange::StatusText(text),
        IssueField::Open => FieldChange::Open(value != "false"),
    }
}
