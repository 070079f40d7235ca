//! Schema versioning for the page database.
//!
//! Each migration is a batch of statements that moves the schema up by one
//! version. Pending migrations run in order, each in its own transaction
//! together with the version bump, so a failed step leaves the database at
//! the last good version.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};

use super::schema::{CREATE_METADATA_TABLE, CREATE_PAGES_TABLE, CREATE_USER_UPDATED_INDEX};

/// Statements for each schema version, starting at version 1.
const MIGRATIONS: &[&[&str]] = &[&[CREATE_PAGES_TABLE, CREATE_USER_UPDATED_INDEX]];

/// The schema version this build writes.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const CURRENT_VERSION: i32 = MIGRATIONS.len() as i32;

const VERSION_KEY: &str = "schema_version";

/// Bring a database up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a migration fails, or if the database was written by
/// a newer build.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {found} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for version in (found + 1)..=CURRENT_VERSION {
        apply(conn, version)?;
        info!(version, "Applied page database migration");
    }
    Ok(())
}

/// The stored schema version; 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    stored.map_or(Ok(0), |value| {
        value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        })
    })
}

fn apply(conn: &Connection, version: i32) -> Result<()> {
    let statements = usize::try_from(version - 1)
        .ok()
        .and_then(|index| MIGRATIONS.get(index))
        .ok_or_else(|| Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        })?;

    let tx = conn.unchecked_transaction()?;
    for statement in *statements {
        tx.execute(statement, [])?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn object_names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    fn force_version(conn: &Connection, value: &str) {
        conn.execute(
            "UPDATE metadata SET value = ?2 WHERE key = ?1",
            (VERSION_KEY, value),
        )
        .unwrap();
    }

    #[test]
    fn test_fresh_database_is_migrated() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();

        let tables = object_names(&conn, "table");
        assert!(tables.contains(&"pages".to_string()));
        assert!(tables.contains(&"metadata".to_string()));
        assert!(object_names(&conn, "index").contains(&"idx_pages_user_updated".to_string()));
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_reopening_is_a_noop() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO pages (id, user_id, created_at, updated_at) VALUES ('p', 'u', 't', 't')",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();
        force_version(&conn, &(CURRENT_VERSION + 1).to_string());

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_garbage_version_is_rejected() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();
        force_version(&conn, "abc");

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_unknown_migration() {
        let conn = fresh();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();

        let err = apply(&conn, CURRENT_VERSION + 1).unwrap_err();
        assert!(err.to_string().contains("unknown migration version"));
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }
}
