//! The signed-in view: the page list plus the editor for the selected page.
//!
//! The dashboard keeps the two controllers in step. Whenever the selection
//! changes it points the editor at the newly selected page, and it feeds
//! every save the editor reports back into the list.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::editor::{EditorContext, EditorEvent, EditorSettings, PageEditor};
use crate::error::{Error, Result};
use crate::interaction::{Interaction, Notice};
use crate::list::PageList;
use crate::page::PageId;
use crate::store::{AuthProvider, ObjectStore, PageStore};
use crate::surface::MarkupSurface;

/// The collaborators a dashboard is built from.
#[derive(Debug, Clone)]
pub struct Services {
    /// Page persistence.
    pub store: Arc<dyn PageStore>,
    /// Image object storage.
    pub objects: Arc<dyn ObjectStore>,
    /// Current user and sign-out.
    pub auth: Arc<dyn AuthProvider>,
    /// Prompts and notices.
    pub interaction: Arc<dyn Interaction>,
}

/// Page list and editor for one signed-in user.
#[derive(Debug)]
pub struct Dashboard {
    list: PageList,
    editor: Option<PageEditor>,
    events: mpsc::UnboundedReceiver<EditorEvent>,
    ctx: EditorContext,
    settings: EditorSettings,
    auth: Arc<dyn AuthProvider>,
}

impl Dashboard {
    /// Build a dashboard for the user currently signed in with `services.auth`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSignedIn`] if nobody is signed in.
    pub fn new(
        services: Services,
        settings: EditorSettings,
        new_page_title: impl Into<String>,
    ) -> Result<Self> {
        let user = services.auth.current_user().ok_or(Error::NotSignedIn)?;
        let (tx, events) = mpsc::unbounded_channel();

        let list = PageList::new(
            Arc::clone(&services.store),
            Arc::clone(&services.interaction),
            user,
            new_page_title,
        );
        let ctx = EditorContext {
            store: services.store,
            objects: services.objects,
            interaction: services.interaction,
            events: tx,
        };

        Ok(Self {
            list,
            editor: None,
            events,
            ctx,
            settings,
            auth: services.auth,
        })
    }

    /// Load the user's pages and open the selected one.
    pub async fn start(&mut self) {
        self.list.load().await;
        self.sync_editor();
    }

    /// The page list.
    #[must_use]
    pub fn list(&self) -> &PageList {
        &self.list
    }

    /// The editor for the selected page, if any page is selected.
    #[must_use]
    pub fn editor(&self) -> Option<&PageEditor> {
        self.editor.as_ref()
    }

    /// Mutable access to the editor, for edits and uploads.
    pub fn editor_mut(&mut self) -> Option<&mut PageEditor> {
        self.editor.as_mut()
    }

    /// Select a page and open it in the editor. Returns `false` for unknown
    /// ids.
    pub fn select(&mut self, id: &PageId) -> bool {
        if !self.list.select(id) {
            return false;
        }
        self.sync_editor();
        true
    }

    /// Create a page and open it.
    pub async fn create_page(&mut self) -> Option<PageId> {
        let id = self.list.create().await?;
        self.sync_editor();
        Some(id)
    }

    /// Delete a page after confirmation, reopening the editor on whatever
    /// is selected afterwards.
    pub async fn delete_page(&mut self, id: &PageId) -> bool {
        let deleted = self.list.delete(id).await;
        if deleted {
            self.sync_editor();
        }
        deleted
    }

    /// Apply every save result that has already arrived.
    pub fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    /// Wait until the editor has no pending or in-flight saves, applying
    /// their results as they arrive.
    pub async fn wait_idle(&mut self) {
        loop {
            self.process_events();

            let busy = self
                .editor
                .as_ref()
                .is_some_and(|e| e.has_pending_save() || e.is_saving());
            if !busy {
                return;
            }

            match self.events.recv().await {
                Some(event) => self.apply(event),
                None => return,
            }
        }
    }

    /// Save outstanding edits, sign out, and clear local state.
    ///
    /// Returns `false`, keeping everything in place, if the outstanding
    /// edits cannot be saved or signing out fails.
    pub async fn sign_out(&mut self) -> bool {
        if let Some(editor) = self.editor.as_mut() {
            if !editor.flush().await {
                warn!(page_id = %editor.page_id(), "Not signing out with unsaved edits");
                return false;
            }
        }
        self.wait_idle().await;

        if let Err(e) = self.auth.sign_out().await {
            error!(error = %e, "Failed to sign out");
            self.ctx
                .interaction
                .notify(Notice::error(format!("Could not sign out: {e}")));
            return false;
        }

        info!(user_id = %self.list.user().id, "Signed out");
        self.editor = None;
        self.list.clear();
        true
    }

    fn apply(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::Saved(page) => self.list.apply_update(page),
            // Already logged and shown by the editor.
            EditorEvent::SaveFailed { page_id, message } => {
                debug!(%page_id, %message, "Save failed");
            }
        }
    }

    /// Point the editor at the list's selection, opening or closing it as
    /// needed.
    fn sync_editor(&mut self) {
        let Some(page) = self.list.selected() else {
            self.editor = None;
            return;
        };

        match self.editor.as_mut() {
            Some(editor) if editor.page_id() == &page.id => {}
            Some(editor) => editor.switch_to(page),
            None => {
                self.editor = Some(PageEditor::open(
                    page,
                    self.ctx.clone(),
                    self.settings,
                    Box::new(MarkupSurface::default()),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::RecordedInteraction;
    use crate::page::Page;
    use crate::store::{MemoryBackend, Operation};
    use crate::upload::ImageFile;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        interaction: Arc<RecordedInteraction>,
        dashboard: Dashboard,
    }

    fn fixture_with(backend: MemoryBackend) -> Fixture {
        crate::logging::init_test_logging();
        let backend = Arc::new(backend);
        let interaction = Arc::new(RecordedInteraction::answering(true));
        let services = Services {
            store: backend.clone(),
            objects: backend.clone(),
            auth: backend.clone(),
            interaction: interaction.clone(),
        };
        let dashboard = Dashboard::new(services, EditorSettings::default(), "Untitled").unwrap();
        Fixture {
            backend,
            interaction,
            dashboard,
        }
    }

    fn seeded_page(id: &str, title: &str, secs: i64) -> Page {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        Page {
            id: PageId::new(id),
            user_id: "local".to_string(),
            title: title.to_string(),
            content: format!("<p>{title}</p>"),
            created_at: at,
            updated_at: at,
        }
    }

    fn two_pages() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.insert_page(seeded_page("b", "B", 3));
        backend.insert_page(seeded_page("a", "A", 5));
        backend
    }

    fn titles(dashboard: &Dashboard) -> Vec<String> {
        dashboard
            .list()
            .pages()
            .iter()
            .map(|p| p.title.clone())
            .collect()
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_requires_signed_in_user() {
        let backend = Arc::new(MemoryBackend::new());
        backend.sign_out().await.unwrap();
        let services = Services {
            store: backend.clone(),
            objects: backend.clone(),
            auth: backend.clone(),
            interaction: Arc::new(RecordedInteraction::default()),
        };

        let result = Dashboard::new(services, EditorSettings::default(), "Untitled");
        assert!(matches!(result, Err(Error::NotSignedIn)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_opens_newest_page() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;

        assert_eq!(titles(&f.dashboard), vec!["A", "B"]);
        let editor = f.dashboard.editor().unwrap();
        assert_eq!(editor.page_id().as_str(), "a");
        assert_eq!(editor.content(), "<p>A</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_no_pages_has_no_editor() {
        let mut f = fixture_with(MemoryBackend::new());
        f.dashboard.start().await;

        assert!(f.dashboard.list().pages().is_empty());
        assert!(f.dashboard.editor().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_selected_reopens_next() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;

        assert!(f.dashboard.delete_page(&PageId::new("a")).await);

        assert_eq!(titles(&f.dashboard), vec!["B"]);
        assert_eq!(f.dashboard.list().selected_id().unwrap().as_str(), "b");
        assert_eq!(f.dashboard.editor().unwrap().page_id().as_str(), "b");
        assert_eq!(f.dashboard.editor().unwrap().title(), "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_drops_pending_save_for_deleted_page() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;

        f.dashboard.editor_mut().unwrap().set_title("A edited");
        assert!(f.dashboard.delete_page(&PageId::new("a")).await);
        wait(2000).await;

        assert_eq!(f.backend.call_count(Operation::UpdatePage), 0);
        assert!(f.interaction.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_last_page_closes_editor() {
        let backend = MemoryBackend::new();
        backend.insert_page(seeded_page("only", "Only", 1));
        let mut f = fixture_with(backend);
        f.dashboard.start().await;

        assert!(f.dashboard.delete_page(&PageId::new("only")).await);
        assert!(f.dashboard.list().selected_id().is_none());
        assert!(f.dashboard.editor().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_on_empty_collection() {
        let mut f = fixture_with(MemoryBackend::new());
        f.dashboard.start().await;

        let id = f.dashboard.create_page().await.unwrap();

        let pages = f.dashboard.list().pages();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, id);
        assert_eq!(pages[0].title, "Untitled");
        assert_eq!(pages[0].content, "");
        let editor = f.dashboard.editor().unwrap();
        assert_eq!(editor.page_id(), &id);
        assert_eq!(editor.title(), "Untitled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_title_reaches_list_after_one_save() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;
        assert!(f.dashboard.select(&PageId::new("b")));

        let mut typed = String::new();
        for c in "Hello".chars() {
            typed.push(c);
            f.dashboard.editor_mut().unwrap().set_title(typed.clone());
            wait(200).await;
        }
        f.dashboard.wait_idle().await;

        let updates = f.backend.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.as_str(), "b");
        assert_eq!(updates[0].1.title, "Hello");

        // The saved page now sorts first.
        assert_eq!(titles(&f.dashboard), vec!["Hello", "A"]);
        assert_eq!(f.dashboard.list().selected().unwrap().title, "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_switches_editor_and_drops_pending_save() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;

        f.dashboard.editor_mut().unwrap().set_content("<p>lost</p>");
        assert!(f.dashboard.select(&PageId::new("b")));
        wait(2000).await;
        f.dashboard.wait_idle().await;

        assert_eq!(f.backend.call_count(Operation::UpdatePage), 0);
        let editor = f.dashboard.editor().unwrap();
        assert_eq!(editor.page_id().as_str(), "b");
        assert_eq!(editor.content(), "<p>B</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_unknown_page_keeps_editor() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;

        assert!(!f.dashboard.select(&PageId::new("missing")));
        assert_eq!(f.dashboard.editor().unwrap().page_id().as_str(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_updates_list_entry() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;
        f.dashboard.select(&PageId::new("b"));

        let file = ImageFile::new("cat.png", "image/png", b"\x89PNG".to_vec());
        assert!(f.dashboard.editor_mut().unwrap().upload_image(file).await);
        f.dashboard.process_events();

        let first = &f.dashboard.list().pages()[0];
        assert_eq!(first.id.as_str(), "b");
        assert!(first.content.ends_with("<p><br></p>"));
        assert!(first.content.contains("<img src=\"memory://objects/local/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_failure_leaves_list_unchanged() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;
        f.backend.set_failing(Operation::UpdatePage, true);

        f.dashboard.editor_mut().unwrap().set_title("Changed");
        f.dashboard.wait_idle().await;

        assert_eq!(titles(&f.dashboard), vec!["A", "B"]);
        assert_eq!(f.dashboard.editor().unwrap().title(), "Changed");
        assert_eq!(f.interaction.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_flushes_and_clears() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;

        f.dashboard.editor_mut().unwrap().set_title("Last words");
        assert!(f.dashboard.sign_out().await);

        assert_eq!(
            f.backend.page(&PageId::new("a")).unwrap().title,
            "Last words"
        );
        assert!(f.backend.current_user().is_none());
        assert!(f.dashboard.list().pages().is_empty());
        assert!(f.dashboard.editor().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_failure_keeps_state() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;
        f.backend.set_failing(Operation::SignOut, true);

        assert!(!f.dashboard.sign_out().await);
        assert_eq!(f.dashboard.list().pages().len(), 2);
        assert!(f.dashboard.editor().is_some());
        assert_eq!(f.interaction.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_keeps_edits_that_fail_to_save() {
        let mut f = fixture_with(two_pages());
        f.dashboard.start().await;
        f.backend.set_failing(Operation::UpdatePage, true);

        f.dashboard.editor_mut().unwrap().set_title("unsaved edit");
        assert!(!f.dashboard.sign_out().await);

        assert_eq!(f.dashboard.editor().unwrap().title(), "unsaved edit");
        assert_eq!(f.backend.page(&PageId::new("a")).unwrap().title, "A");
        assert!(f.backend.current_user().is_some());
        assert_eq!(f.backend.call_count(Operation::SignOut), 0);
        assert_eq!(f.dashboard.list().pages().len(), 2);
        assert_eq!(f.interaction.errors().len(), 1);
    }
}
