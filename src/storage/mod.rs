//! Issue storage.
//!
//! `IssueStore` is the document-store seam the handlers are written
//! against: insert with a store-assigned ID, filtered find, and atomic
//! find-and-update / find-and-delete by ID. `SqliteStorage` is the
//! implementation the server runs on.

pub mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::Result;
use crate::model::{Issue, IssueField, IssueId, IssueUpdate, NewIssue};

/// Document store for issues.
///
/// Implementations own all consistency guarantees: single-record updates
/// and deletes must be atomic, and a caller must see its own writes.
pub trait IssueStore: Send + Sync {
    /// Persist a new issue, assigning its ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn insert(&self, new: NewIssue) -> Result<Issue>;

    /// All issues matching `query`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn find(&self, query: &IssueQuery) -> Result<Vec<Issue>>;

    /// Fetch one issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn find_by_id(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Apply `update` and return the updated record, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn update_by_id(&self, id: &IssueId, update: &IssueUpdate) -> Result<Option<Issue>>;

    /// Remove an issue and return it, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn delete_by_id(&self, id: &IssueId) -> Result<Option<Issue>>;
}

/// A filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Id,
    Field(IssueField),
    CreatedOn,
    UpdatedOn,
}

impl FilterField {
    /// Resolve a query-string key. `project` is not filterable this way.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "_id" => Some(Self::Id),
            "created_on" => Some(Self::CreatedOn),
            "updated_on" => Some(Self::UpdatedOn),
            other => IssueField::from_key(other).map(Self::Field),
        }
    }

    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Field(field) => field.as_str(),
            Self::CreatedOn => "created_on",
            Self::UpdatedOn => "updated_on",
        }
    }
}

/// A typed filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Flag(bool),
}

/// One equality condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: FilterField,
    pub value: FilterValue,
}

/// Equality filters ANDed with the project scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub project: String,
    pub conditions: Vec<Condition>,
}

impl IssueQuery {
    /// Every issue in `project`.
    #[must_use]
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            conditions: Vec::new(),
        }
    }

    /// Add an equality condition.
    #[must_use]
    pub fn with(mut self, field: FilterField, value: FilterValue) -> Self {
        self.conditions.push(Condition { field, value });
        self
    }
}
