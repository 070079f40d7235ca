//! The data-layer contract the controllers talk to.
//!
//! Persistence, object storage, and authentication all sit behind the traits
//! in this module. The controllers never see which backend is in use:
//!
//! - [`PageStore`]: the page table (list, create, update, delete).
//! - [`ObjectStore`]: binary objects for uploaded images.
//! - [`AuthProvider`]: the signed-in user and sign-out.
//!
//! Local implementations are provided for each: [`SqlitePageStore`],
//! [`FsObjectStore`], [`LocalSession`], and the all-in-one [`MemoryBackend`].

pub mod memory;
pub mod objects;
pub mod session;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::page::{Page, PageId, PageUpdate};

pub use memory::{MemoryBackend, Operation};
pub use objects::FsObjectStore;
pub use session::LocalSession;
pub use sqlite::SqlitePageStore;

/// The authenticated user, supplied by an [`AuthProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Owning id used for pages and upload namespaces.
    pub id: String,
    /// Email address, for display.
    pub email: String,
}

/// Persistent storage for pages.
#[async_trait]
pub trait PageStore: Send + Sync + std::fmt::Debug {
    /// All pages owned by `user_id`, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_pages(&self, user_id: &str) -> Result<Vec<Page>>;

    /// Create a page and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn create_page(&self, user_id: &str, title: &str, content: &str) -> Result<Page>;

    /// Overwrite title, content, and timestamp of an existing page.
    ///
    /// Never creates a page; an unknown id is an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PageNotFound`] for an unknown id, or another
    /// error if the request fails.
    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> Result<Page>;

    /// Delete a page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PageNotFound`] for an unknown id, or another
    /// error if the request fails.
    async fn delete_page(&self, id: &PageId) -> Result<()>;
}

/// Storage for uploaded binary objects.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Store `bytes` under `path` (`{user_id}/{object_name}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be stored.
    async fn upload_object(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// The public URL an uploaded object is served from.
    fn public_url(&self, path: &str) -> String;
}

/// Source of the signed-in user.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<CurrentUser>;

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be ended.
    async fn sign_out(&self) -> Result<()>;
}

/// Join a user namespace and an object name into an object path.
#[must_use]
pub fn object_path(user_id: &str, object_name: &str) -> String {
    format!("{user_id}/{object_name}")
}
