//! The page record and its update payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title shown for pages without one, and given to new pages by default.
pub const UNTITLED: &str = "Untitled";

/// Opaque page identifier assigned by the store at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Wrap an identifier produced by a store.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A single document owned by one user.
///
/// `content` is an HTML fragment produced by the editing surface. It is
/// stored and re-rendered but never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Store-assigned identifier, stable across edits.
    pub id: PageId,
    /// Owning user.
    pub user_id: String,
    /// Free-text title; may be empty.
    pub title: String,
    /// Rich-text markup.
    pub content: String,
    /// When the page was created.
    pub created_at: DateTime<Utc>,
    /// When the page was last saved. Lists sort on this, newest first.
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// The title to show in lists, falling back to "Untitled".
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// The last-modified date shown next to the title.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.updated_at.format("%b %-d, %Y").to_string()
    }
}

/// Fields sent with every save. The store replaces all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdate {
    /// New title.
    pub title: String,
    /// New content markup.
    pub content: String,
    /// Timestamp of this save.
    pub updated_at: DateTime<Utc>,
}

impl PageUpdate {
    /// Build an update stamped with the current time.
    #[must_use]
    pub fn now(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            updated_at: Utc::now(),
        }
    }
}
