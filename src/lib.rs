//! `issue_tracker` - project-scoped issue tracking over HTTP, stored in `SQLite`.
//!
//! Layout, leaf first:
//! - [`storage`]: the `IssueStore` seam and its `SQLite` implementation
//! - [`model`]: issue records, identifiers and raw payloads
//! - [`validation`]: creation checks and update normalization
//! - [`api`]: the create/list/update/delete handlers
//! - [`server`]: the axum router that exposes them

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod server;
pub mod storage;
pub mod util;
pub mod validation;

pub use error::{ErrorCode, Result, StructuredError, TrackerError};
pub use model::{Issue, IssueId, IssueUpdate, NewIssue, RawPayload};
pub use server::{AppState, router};
pub use storage::{IssueQuery, IssueStore, SqliteStorage};
