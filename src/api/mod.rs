//! Resource handlers.
//!
//! Each handler is a synchronous `execute` over an injected
//! [`IssueStore`](crate::storage::IssueStore). They hold no state between
//! calls; the HTTP layer runs them on the blocking pool.

pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use serde::Serialize;
use std::fmt;

/// The four operations on `/api/issues/{project}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    List,
    Update,
    Delete,
}

impl Operation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success body for update and delete: `{"result": ..., "_id": ...}`.
///
/// `_id` is the stored key, trimmed and lowercased. Error bodies instead echo
/// `_id` exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: String,
}

impl Confirmation {
    #[must_use]
    pub fn updated(id: impl Into<String>) -> Self {
        Self {
            result: "successfully updated".to_string(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn deleted(id: impl Into<String>) -> Self {
        Self {
            result: "successfully deleted".to_string(),
            id: id.into(),
        }
    }
}
