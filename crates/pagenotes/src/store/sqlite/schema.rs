//! `SQLite` table and index definitions for the page store.
//!
//! Statements are applied by [`migrations`](super::migrations); each one is
//! safe to run against a database that already has the object.

/// SQL statement to create the pages table.
pub const CREATE_PAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the per-user listing index.
pub const CREATE_USER_UPDATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_pages_user_updated ON pages(user_id, updated_at DESC)
";

/// Key-value table holding the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";
