//! Core data types for `issue_tracker`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Issue` - A stored ticket, scoped to a project
//! - `NewIssue` - Validated creation input, before the store assigns an ID
//! - `IssueId` - A well-formed store key
//! - `IssueField` / `FieldChange` - The closed set of mutable fields
//! - `IssueUpdate` - A normalized partial update
//! - `RawPayload` - Field name to string value, as received from a client

mod payload;

pub use payload::RawPayload;

use crate::error::{Result, TrackerError};
use crate::util::id::{is_valid_id_format, normalize_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload key carrying the issue identifier.
pub const ID_KEY: &str = "_id";

/// A stored issue.
///
/// Field names are the wire names; `id` is rendered as `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    #[serde(with = "crate::util::time::millis")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "crate::util::time::millis")]
    pub updated_on: DateTime<Utc>,
    pub project: String,
}

impl Issue {
    /// Build the stored record for a new issue.
    ///
    /// `open` is always true and both timestamps are `now`, whatever the
    /// client sent.
    #[must_use]
    pub fn create(new: NewIssue, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            issue_title: new.issue_title,
            issue_text: new.issue_text,
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            status_text: new.status_text,
            open: true,
            created_on: now,
            updated_on: now,
            project: new.project,
        }
    }

    /// Apply a normalized update in memory.
    pub fn apply(&mut self, update: &IssueUpdate) {
        for change in &update.changes {
            match change {
                FieldChange::IssueTitle(v) => self.issue_title.clone_from(v),
                FieldChange::IssueText(v) => self.issue_text.clone_from(v),
                FieldChange::CreatedBy(v) => self.created_by.clone_from(v),
                FieldChange::AssignedTo(v) => self.assigned_to.clone_from(v),
                FieldChange::StatusText(v) => self.status_text.clone_from(v),
                FieldChange::Open(v) => self.open = *v,
            }
        }
        if update.updated_on > self.updated_on {
            self.updated_on = update.updated_on;
        }
    }
}

/// Creation input after required-field checks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewIssue {
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    /// Empty string when not supplied.
    pub assigned_to: String,
    /// Empty string when not supplied.
    pub status_text: String,
}

/// A well-formed store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueId(String);

impl IssueId {
    /// Check the shape of a client-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` (carrying the raw input) if the value cannot be a
    /// store key. No lookup is performed.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize_id(raw);
        if is_valid_id_format(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(TrackerError::InvalidId {
                id: raw.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The mutable issue fields. Nothing outside this set reaches an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
    Open,
}

impl IssueField {
    pub const ALL: [Self; 6] = [
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
        Self::Open,
    ];

    /// Fields that must be non-empty for the lifetime of a record.
    pub const REQUIRED: [Self; 3] = [Self::IssueTitle, Self::IssueText, Self::CreatedBy];

    /// Wire (and column) name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IssueTitle => "issue_title",
            Self::IssueText => "issue_text",
            Self::CreatedBy => "created_by",
            Self::AssignedTo => "assigned_to",
            Self::StatusText => "status_text",
            Self::Open => "open",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::IssueTitle | Self::IssueText | Self::CreatedBy)
    }
}

impl fmt::Display for IssueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One admitted change, already coerced to the field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    IssueTitle(String),
    IssueText(String),
    CreatedBy(String),
    AssignedTo(String),
    StatusText(String),
    Open(bool),
}

impl FieldChange {
    #[must_use]
    pub const fn field(&self) -> IssueField {
        match self {
            Self::IssueTitle(_) => IssueField::IssueTitle,
            Self::IssueText(_) => IssueField::IssueText,
            Self::CreatedBy(_) => IssueField::CreatedBy,
            Self::AssignedTo(_) => IssueField::AssignedTo,
            Self::StatusText(_) => IssueField::StatusText,
            Self::Open(_) => IssueField::Open,
        }
    }
}

/// A normalized partial update: at least one change, plus the new `updated_on`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueUpdate {
    pub changes: Vec<FieldChange>,
    pub updated_on: DateTime<Utc>,
}

impl IssueUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The change for `field`, if one was admitted.
    #[must_use]
    pub fn get(&self, field: IssueField) -> Option<&FieldChange> {
        self.changes.iter().find(|change| change.field() == field)
    }
}
