//! Database schema definitions.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the issue database.
pub const SCHEMA_SQL: &str = r"
    -- Issues table
    -- Optional text fields are NOT NULL DEFAULT '' so reads never see NULL.
    -- Timestamps are fixed-width RFC3339 text, so text order is time order.
    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        project TEXT NOT NULL,
        issue_title TEXT NOT NULL,
        issue_text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        assigned_to TEXT NOT NULL DEFAULT '',
        status_text TEXT NOT NULL DEFAULT '',
        open INTEGER NOT NULL DEFAULT 1,
        created_on TEXT NOT NULL,
        updated_on TEXT NOT NULL,
        CHECK (length(issue_title) >= 1),
        CHECK (length(issue_text) >= 1),
        CHECK (length(created_by) >= 1),
        CHECK (updated_on >= created_on)
    );

    CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project);
    CREATE INDEX IF NOT EXISTS idx_issues_project_open ON issues(project, open);
    CREATE INDEX IF NOT EXISTS idx_issues_created_by ON issues(created_by);
";

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;

    Ok(())
}
