//! `SQLite` storage implementation.

use crate::error::{Result, TrackerError};
use crate::model::{FieldChange, Issue, IssueId, IssueUpdate, NewIssue};
use crate::storage::schema::apply_schema;
use crate::storage::{FilterValue, IssueQuery, IssueStore};
use crate::util::id::IdGenerator;
use crate::util::time::{self, format_timestamp};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const ISSUE_COLUMNS: &str = "id, project, issue_title, issue_text, created_by, assigned_to, \
                             status_text, open, created_on, updated_on";

/// SQLite-based storage backend.
///
/// One connection behind a mutex; every mutation runs in an `IMMEDIATE`
/// transaction so a find-and-modify is atomic with respect to other writers
/// on the same database file.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened issue database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database. Contents vanish with the value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Flush and close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses to close the handle.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| TrackerError::store_unavailable("connection lock poisoned"))?;
        conn.close().map_err(|(_, err)| TrackerError::Database(err))
    }

    /// Number of stored issues, across all projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::store_unavailable("connection lock poisoned"))
    }

    /// Run `f` inside an `IMMEDIATE` transaction and commit on success.
    fn mutate<F, R>(&self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        debug!(op, "Committed mutation");
        Ok(result)
    }

    fn id_exists(conn: &Connection, id: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM issues WHERE id = ?", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn get_issue(conn: &Connection, id: &str) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?");
        let issue = conn
            .query_row(&sql, [id], issue_from_row)
            .optional()?;
        Ok(issue)
    }
}

impl IssueStore for SqliteStorage {
    fn insert(&self, new: NewIssue) -> Result<Issue> {
        self.mutate("insert", |tx| {
            let now = time::now();
            let id = IdGenerator::generate(
                &new.project,
                &new.issue_title,
                &new.created_by,
                now,
                |candidate| Self::id_exists(tx, candidate),
            )?;
            let issue = Issue::create(new, id, now);

            tx.execute(
                &format!(
                    "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                rusqlite::params![
                    issue.id,
                    issue.project,
                    issue.issue_title,
                    issue.issue_text,
                    issue.created_by,
                    issue.assigned_to,
                    issue.status_text,
                    issue.open,
                    format_timestamp(&issue.created_on),
                    format_timestamp(&issue.updated_on),
                ],
            )?;
            Ok(issue)
        })
    }

    fn find(&self, query: &IssueQuery) -> Result<Vec<Issue>> {
        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(query.project.clone())];

        for condition in &query.conditions {
            sql.push_str(" AND ");
            sql.push_str(condition.field.column());
            sql.push_str(" = ?");
            match &condition.value {
                FilterValue::Text(text) => params.push(Box::new(text.clone())),
                FilterValue::Flag(flag) => params.push(Box::new(*flag)),
            }
        }
        sql.push_str(" ORDER BY rowid");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(param_refs.as_slice(), issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    fn find_by_id(&self, id: &IssueId) -> Result<Option<Issue>> {
        let conn = self.lock()?;
        Self::get_issue(&conn, id.as_str())
    }

    fn update_by_id(&self, id: &IssueId, update: &IssueUpdate) -> Result<Option<Issue>> {
        self.mutate("update", |tx| {
            let Some(mut issue) = Self::get_issue(tx, id.as_str())? else {
                return Ok(None);
            };
            issue.apply(update);

            let mut set_clauses: Vec<String> = vec![];
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];
            let mut add_update = |column: &str, val: Box<dyn rusqlite::ToSql>| {
                set_clauses.push(format!("{column} = ?"));
                params.push(val);
            };

            for change in &update.changes {
                let column = change.field().as_str();
                match change {
                    FieldChange::IssueTitle(v)
                    | FieldChange::IssueText(v)
                    | FieldChange::CreatedBy(v)
                    | FieldChange::AssignedTo(v)
                    | FieldChange::StatusText(v) => add_update(column, Box::new(v.clone())),
                    FieldChange::Open(flag) => add_update(column, Box::new(*flag)),
                }
            }
            add_update("updated_on", Box::new(format_timestamp(&issue.updated_on)));
            params.push(Box::new(issue.id.clone()));

            let sql = format!("UPDATE issues SET {} WHERE id = ?", set_clauses.join(", "));
            let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
            tx.execute(&sql, param_refs.as_slice())?;

            Ok(Some(issue))
        })
    }

    fn delete_by_id(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.mutate("delete", |tx| {
            let Some(issue) = Self::get_issue(tx, id.as_str())? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM issues WHERE id = ?", [id.as_str()])?;
            Ok(Some(issue))
        })
    }
}

fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        project: row.get(1)?,
        issue_title: row.get(2)?,
        issue_text: row.get(3)?,
        created_by: row.get(4)?,
        assigned_to: row.get(5)?,
        status_text: row.get(6)?,
        open: row.get(7)?,
        created_on: timestamp_column(row, 8)?,
        updated_on: timestamp_column(row, 9)?,
    })
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    time::parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}
