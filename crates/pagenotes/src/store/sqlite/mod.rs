//! `SQLite`-backed page store.
//!
//! Stands in for the managed page table when running locally. Timestamps are
//! stored as fixed-width RFC 3339 strings so that text ordering matches time
//! ordering.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::PageStore;
use crate::error::{Error, Result};
use crate::page::{Page, PageId, PageUpdate};

const PAGE_COLUMNS: &str = "id, user_id, title, content, created_at, updated_at";

/// Page storage in a local `SQLite` database.
#[derive(Debug)]
pub struct SqlitePageStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqlitePageStore {
    /// Open or create a page database at the given path.
    ///
    /// Creates parent directories and initializes the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening page database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Page database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a single page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: &PageId) -> Result<Option<Page>> {
        let conn = self.lock()?;
        Self::get_with(&conn, id)
    }

    /// Count all pages owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, user_id: &str) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("page database lock poisoned"))
    }

    fn get_with(conn: &Connection, id: &PageId) -> Result<Option<Page>> {
        let page = conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                [id.as_str()],
                Self::row_to_page,
            )
            .optional()?;
        Ok(page)
    }

    fn row_to_page(row: &rusqlite::Row) -> rusqlite::Result<Page> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;

        Ok(Page {
            user_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            created_at: parse_timestamp(&id, &created_at),
            updated_at: parse_timestamp(&id, &updated_at),
            id: PageId::new(id),
        })
    }
}

#[async_trait]
impl PageStore for SqlitePageStore {
    async fn list_pages(&self, user_id: &str) -> Result<Vec<Page>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE user_id = ?1
             ORDER BY updated_at DESC, rowid DESC"
        ))?;

        let pages = stmt
            .query_map([user_id], Self::row_to_page)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(user_id, count = pages.len(), "Listed pages");
        Ok(pages)
    }

    async fn create_page(&self, user_id: &str, title: &str, content: &str) -> Result<Page> {
        let conn = self.lock()?;
        let id = PageId::generate();
        let now = format_timestamp(Utc::now());

        conn.execute(
            "INSERT INTO pages (id, user_id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id.as_str(), user_id, title, content, now],
        )?;

        debug!(page_id = %id, "Created page");
        Self::get_with(&conn, &id)?
            .ok_or_else(|| Error::internal(format!("page {id} vanished after insert")))
    }

    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> Result<Page> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE pages SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                update.title,
                update.content,
                format_timestamp(update.updated_at),
                id.as_str()
            ],
        )?;

        if affected == 0 {
            return Err(Error::page_not_found(id));
        }

        debug!(page_id = %id, "Updated page");
        Self::get_with(&conn, id)?.ok_or_else(|| Error::page_not_found(id))
    }

    async fn delete_page(&self, id: &PageId) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM pages WHERE id = ?1", [id.as_str()])?;

        if affected == 0 {
            return Err(Error::page_not_found(id));
        }

        debug!(page_id = %id, "Deleted page");
        Ok(())
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(
        |_| {
            warn!(page_id = id, value, "Unparseable page timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        },
        |dt| dt.with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_store() -> SqlitePageStore {
        SqlitePageStore::open_in_memory().expect("failed to create test store")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = create_test_store();
        let page = store.create_page("u1", "Untitled", "").await.unwrap();

        assert_eq!(page.user_id, "u1");
        assert_eq!(page.title, "Untitled");
        assert_eq!(page.content, "");
        assert_eq!(page.created_at, page.updated_at);

        let fetched = store.get(&page.id).unwrap().unwrap();
        assert_eq!(fetched, page);
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at_desc() {
        let store = create_test_store();
        let a = store.create_page("u1", "A", "").await.unwrap();
        let b = store.create_page("u1", "B", "").await.unwrap();

        let update = PageUpdate {
            title: "A2".to_string(),
            content: String::new(),
            updated_at: b.updated_at + Duration::seconds(5),
        };
        store.update_page(&a.id, &update).await.unwrap();

        let pages = store.list_pages("u1").await.unwrap();
        let titles: Vec<_> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A2", "B"]);
    }

    #[tokio::test]
    async fn test_list_newest_created_first() {
        let store = create_test_store();
        store.create_page("u1", "first", "").await.unwrap();
        store.create_page("u1", "second", "").await.unwrap();

        let pages = store.list_pages("u1").await.unwrap();
        assert_eq!(pages[0].title, "second");
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_user() {
        let store = create_test_store();
        store.create_page("u1", "mine", "").await.unwrap();
        store.create_page("u2", "theirs", "").await.unwrap();

        let pages = store.list_pages("u1").await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "mine");
        assert_eq!(store.count("u2").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_returns_canonical_record() {
        let store = create_test_store();
        let page = store.create_page("u1", "", "").await.unwrap();

        let update = PageUpdate::now("Hello", "<p>world</p>");
        let saved = store.update_page(&page.id, &update).await.unwrap();

        assert_eq!(saved.id, page.id);
        assert_eq!(saved.title, "Hello");
        assert_eq!(saved.content, "<p>world</p>");
        assert_eq!(saved.created_at, page.created_at);
        // Stored at microsecond precision.
        assert_eq!(
            saved.updated_at.timestamp_micros(),
            update.updated_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = create_test_store();
        let err = store
            .update_page(&PageId::new("missing"), &PageUpdate::now("x", ""))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count("u1").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = create_test_store();
        let page = store.create_page("u1", "bye", "").await.unwrap();

        store.delete_page(&page.id).await.unwrap();
        assert!(store.get(&page.id).unwrap().is_none());

        let err = store.delete_page(&page.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unicode_and_large_content() {
        let store = create_test_store();
        let page = store.create_page("u1", "", "").await.unwrap();
        let content = format!("<p>Hello 世界 🌍</p>{}", "x".repeat(100_000));

        let saved = store
            .update_page(&page.id, &PageUpdate::now("Ünïcödé", content.clone()))
            .await
            .unwrap();
        assert_eq!(saved.content, content);
        assert_eq!(saved.title, "Ünïcödé");
    }

    #[test]
    fn test_path() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
    }

    #[tokio::test]
    async fn test_open_file_based_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!(
            "pagenotes_sqlite_test_{}_{}",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        let db_path = dir.join("nested").join("pages.db");

        let store = SqlitePageStore::open(&db_path).unwrap();
        store.create_page("u1", "persisted", "").await.unwrap();
        drop(store);

        let reopened = SqlitePageStore::open(&db_path).unwrap();
        let pages = reopened.list_pages("u1").await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "persisted");

        drop(reopened);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = format_timestamp(DateTime::<Utc>::UNIX_EPOCH);
        let b = format_timestamp(Utc::now());
        assert_eq!(a.len(), b.len());
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn test_parse_timestamp_fallback() {
        assert_eq!(parse_timestamp("p", "garbage"), DateTime::<Utc>::UNIX_EPOCH);
    }
}
