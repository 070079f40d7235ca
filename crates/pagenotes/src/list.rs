//! The page list controller.
//!
//! Holds the signed-in user's pages, newest first, and which one is selected.
//! The collection only changes in response to completed requests made here,
//! or through [`PageList::apply_update`] after the editor saves.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::Error;
use crate::interaction::{Interaction, Notice};
use crate::page::{Page, PageId};
use crate::store::{CurrentUser, PageStore};

/// The user's pages and the current selection.
#[derive(Debug)]
pub struct PageList {
    store: Arc<dyn PageStore>,
    interaction: Arc<dyn Interaction>,
    user: CurrentUser,
    new_page_title: String,
    pages: Vec<Page>,
    selected: Option<PageId>,
    loading: bool,
}

impl PageList {
    /// Create an empty list for `user`. Nothing is fetched until
    /// [`load`](Self::load).
    #[must_use]
    pub fn new(
        store: Arc<dyn PageStore>,
        interaction: Arc<dyn Interaction>,
        user: CurrentUser,
        new_page_title: impl Into<String>,
    ) -> Self {
        Self {
            store,
            interaction,
            user,
            new_page_title: new_page_title.into(),
            pages: Vec::new(),
            selected: None,
            loading: false,
        }
    }

    /// The pages, most recently updated first.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The signed-in user this list belongs to.
    #[must_use]
    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Whether a load is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The selected page id.
    #[must_use]
    pub fn selected_id(&self) -> Option<&PageId> {
        self.selected.as_ref()
    }

    /// The selected page.
    #[must_use]
    pub fn selected(&self) -> Option<&Page> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Look up a page in the local collection.
    #[must_use]
    pub fn get(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == *id)
    }

    /// Find a page by exact id or by a prefix matching exactly one page.
    #[must_use]
    pub fn resolve(&self, id_or_prefix: &str) -> Option<&Page> {
        if id_or_prefix.is_empty() {
            return None;
        }
        if let Some(page) = self.pages.iter().find(|p| p.id.as_str() == id_or_prefix) {
            return Some(page);
        }
        let mut matches = self
            .pages
            .iter()
            .filter(|p| p.id.as_str().starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(page), None) => Some(page),
            _ => None,
        }
    }

    /// Select a page. Returns `false` if it is not in the collection.
    pub fn select(&mut self, id: &PageId) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Fetch the user's pages, replacing the local collection.
    ///
    /// Keeps the current selection if it still exists, otherwise selects the
    /// newest page. On failure the collection is left as it was.
    pub async fn load(&mut self) {
        self.loading = true;
        let result = self.store.list_pages(&self.user.id).await;
        self.loading = false;

        match result {
            Ok(pages) => {
                info!(count = pages.len(), "Loaded pages");
                self.pages = pages;
                let still_there = self
                    .selected
                    .as_ref()
                    .is_some_and(|id| self.get(id).is_some());
                if !still_there {
                    self.selected = self.pages.first().map(|p| p.id.clone());
                }
            }
            Err(e) => self.report("load pages", &e),
        }
    }

    /// Create an empty page, put it first, and select it.
    ///
    /// Returns the new page's id, or `None` if the request failed.
    pub async fn create(&mut self) -> Option<PageId> {
        match self
            .store
            .create_page(&self.user.id, &self.new_page_title, "")
            .await
        {
            Ok(page) => {
                info!(page_id = %page.id, "Created page");
                let id = page.id.clone();
                self.pages.insert(0, page);
                self.selected = Some(id.clone());
                Some(id)
            }
            Err(e) => {
                self.report("create a page", &e);
                None
            }
        }
    }

    /// Delete a page after the user confirms.
    ///
    /// Returns `true` if the page was deleted. If it was selected, the
    /// newest remaining page becomes selected, or nothing if none remain.
    pub async fn delete(&mut self, id: &PageId) -> bool {
        let title = self
            .get(id)
            .map_or_else(|| id.to_string(), |p| p.display_title().to_string());
        let prompt = format!("Delete \"{title}\"? This cannot be undone.");
        if !self.interaction.confirm(&prompt) {
            debug!(page_id = %id, "Delete cancelled");
            return false;
        }

        if let Err(e) = self.store.delete_page(id).await {
            self.report("delete the page", &e);
            return false;
        }

        info!(page_id = %id, "Deleted page");
        self.pages.retain(|p| p.id != *id);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.pages.first().map(|p| p.id.clone());
        }
        true
    }

    /// Replace the local copy of a page with a freshly saved record.
    ///
    /// Records for pages no longer in the collection are ignored.
    pub fn apply_update(&mut self, page: Page) {
        let Some(slot) = self.pages.iter_mut().find(|p| p.id == page.id) else {
            debug!(page_id = %page.id, "Ignoring update for page not in list");
            return;
        };
        *slot = page;
        // Stable, so equal timestamps keep their relative order.
        self.pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    /// Drop all local state.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.selected = None;
    }

    fn report(&self, action: &str, err: &Error) {
        error!(user_id = %self.user.id, error = %err, "Failed to {action}");
        self.interaction
            .notify(Notice::error(format!("Could not {action}: {err}")));
    }
}
