//! The page editor controller.
//!
//! The editor owns the working copy of one page's title and content and is
//! the only component that writes pages. Edits update the working copy at
//! once and (re)arm a deferred save; only the state at the end of a burst of
//! edits is sent. Image uploads save immediately.
//!
//! Save results are reported as [`EditorEvent`]s on the channel in the
//! [`EditorContext`], so whoever owns the page list can apply them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::autosave::Debouncer;
use crate::config::Config;
use crate::error::Result;
use crate::interaction::{Interaction, Notice};
use crate::page::{Page, PageId, PageUpdate};
use crate::store::{object_path, ObjectStore, PageStore};
use crate::surface::{EditableSurface, FormatCommand};
use crate::upload::{image_markup, ImageFile};

/// Outcome of a save, sent from the editor to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The store accepted a save and returned the canonical record.
    Saved(Page),
    /// A save failed. The editor's working copy is unchanged.
    SaveFailed {
        /// The page that failed to save.
        page_id: PageId,
        /// Why.
        message: String,
    },
}

/// Collaborators shared by every editor instance.
#[derive(Debug, Clone)]
pub struct EditorContext {
    /// Page persistence.
    pub store: Arc<dyn PageStore>,
    /// Image object storage.
    pub objects: Arc<dyn ObjectStore>,
    /// Prompts and notices.
    pub interaction: Arc<dyn Interaction>,
    /// Where save results go.
    pub events: mpsc::UnboundedSender<EditorEvent>,
}

/// Editor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    /// Quiet period before a deferred save is sent.
    pub autosave_delay: Duration,
    /// Upload size limit.
    pub max_image_bytes: Option<usize>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_secs(1),
            max_image_bytes: Some(10 * 1024 * 1024),
        }
    }
}

impl EditorSettings {
    /// Settings from the editor section of the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            autosave_delay: config.autosave_delay(),
            max_image_bytes: config.max_image_bytes(),
        }
    }
}

/// Editor for one page at a time.
#[derive(Debug)]
pub struct PageEditor {
    ctx: EditorContext,
    settings: EditorSettings,
    page_id: PageId,
    user_id: String,
    title: String,
    content: String,
    surface: Box<dyn EditableSurface>,
    autosave: Debouncer,
    in_flight: Arc<AtomicUsize>,
    uploading: bool,
}

impl PageEditor {
    /// Open `page` for editing, showing its content on `surface`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn open(
        page: &Page,
        ctx: EditorContext,
        settings: EditorSettings,
        mut surface: Box<dyn EditableSurface>,
    ) -> Self {
        surface.set_markup(&page.content);
        Self {
            ctx,
            settings,
            page_id: page.id.clone(),
            user_id: page.user_id.clone(),
            title: page.title.clone(),
            content: page.content.clone(),
            surface,
            autosave: Debouncer::new(settings.autosave_delay),
            in_flight: Arc::new(AtomicUsize::new(0)),
            uploading: false,
        }
    }

    /// Point the editor at another page.
    ///
    /// A deferred save still waiting for the previous page is dropped, and
    /// the working copy is reset from `page`. Saves already sent still
    /// complete and are still reported.
    pub fn switch_to(&mut self, page: &Page) {
        if self.autosave.cancel() {
            debug!(page_id = %self.page_id, "Dropped pending save on page switch");
        }
        self.page_id = page.id.clone();
        self.user_id.clone_from(&page.user_id);
        self.title.clone_from(&page.title);
        self.content.clone_from(&page.content);
        self.surface.set_markup(&page.content);
        self.uploading = false;
    }

    /// The page being edited.
    #[must_use]
    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    /// Working title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Working content markup.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether any save has been sent and not yet answered.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Whether an image upload is in progress.
    #[must_use]
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Whether a deferred save is waiting for its quiet period.
    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.autosave.is_pending()
    }

    /// The editing surface.
    #[must_use]
    pub fn surface(&self) -> &dyn EditableSurface {
        self.surface.as_ref()
    }

    /// The editing surface, e.g. to change its selection.
    pub fn surface_mut(&mut self) -> &mut dyn EditableSurface {
        self.surface.as_mut()
    }

    /// Change the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.schedule_save();
    }

    /// Replace the content, updating the surface.
    pub fn set_content(&mut self, markup: impl Into<String>) {
        self.content = markup.into();
        self.surface.set_markup(&self.content);
        self.schedule_save();
    }

    /// Take the surface's current markup as the content, after the user
    /// typed into it.
    pub fn capture_content(&mut self) {
        self.content = self.surface.markup();
        self.schedule_save();
    }

    /// Run a formatting command on the surface and capture the result.
    pub fn format(&mut self, command: FormatCommand) {
        trace!(%command, "Formatting");
        self.surface.exec_command(command);
        self.capture_content();
    }

    /// Send any pending deferred save now.
    ///
    /// Returns `false` only if a pending save was sent and failed.
    pub async fn flush(&mut self) -> bool {
        if !self.autosave.cancel() {
            return true;
        }
        match self.save_now().await {
            Ok(_) => true,
            Err(e) => {
                self.ctx
                    .interaction
                    .notify(Notice::error(format!("Could not save the page: {e}")));
                false
            }
        }
    }

    /// Upload an image, append it to the content, and save immediately.
    ///
    /// Non-images and oversized files are rejected before anything is sent.
    /// Every failure is reported as a notice; the uploading flag is cleared
    /// on every path. Returns `true` if the image was uploaded and saved.
    pub async fn upload_image(&mut self, file: ImageFile) -> bool {
        self.uploading = true;
        let result = self.try_upload_image(&file).await;
        self.uploading = false;

        match result {
            Ok(()) => true,
            Err(e) => {
                if e.is_validation_error() {
                    warn!(file = %file.file_name, error = %e, "Rejected upload");
                } else {
                    error!(file = %file.file_name, error = %e, "Image upload failed");
                }
                self.ctx
                    .interaction
                    .notify(Notice::error(format!("Could not upload image: {e}")));
                false
            }
        }
    }

    async fn try_upload_image(&mut self, file: &ImageFile) -> Result<()> {
        file.validate(self.settings.max_image_bytes)?;

        let path = object_path(&self.user_id, &file.object_name());
        self.ctx.objects.upload_object(&path, &file.bytes).await?;
        let url = self.ctx.objects.public_url(&path);
        info!(%path, size = file.bytes.len(), "Uploaded image");

        self.surface.append_markup(&image_markup(&url, &file.file_name));
        self.content = self.surface.markup();
        self.save_now().await?;
        Ok(())
    }

    /// Save the working copy immediately, replacing any pending deferred
    /// save since this one carries newer state.
    async fn save_now(&mut self) -> Result<Page> {
        self.autosave.cancel();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        persist(
            &self.ctx,
            &self.in_flight,
            self.page_id.clone(),
            PageUpdate::now(self.title.clone(), self.content.clone()),
        )
        .await
    }

    fn schedule_save(&mut self) {
        let ctx = self.ctx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let page_id = self.page_id.clone();
        let title = self.title.clone();
        let content = self.content.clone();

        self.autosave.schedule(move || {
            // The save outlives the timer so that cancelling a later
            // schedule cannot abort a request already sent.
            in_flight.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let update = PageUpdate::now(title, content);
                if let Err(e) = persist(&ctx, &in_flight, page_id, update).await {
                    ctx.interaction
                        .notify(Notice::error(format!("Could not save the page: {e}")));
                }
            });
        });
    }
}

/// Send one save and report the outcome. The caller has already counted it
/// in `in_flight`.
async fn persist(
    ctx: &EditorContext,
    in_flight: &AtomicUsize,
    page_id: PageId,
    update: PageUpdate,
) -> Result<Page> {
    debug!(page_id = %page_id, "Saving page");
    let result = ctx.store.update_page(&page_id, &update).await;
    in_flight.fetch_sub(1, Ordering::SeqCst);

    // Nobody listening is fine: the owner may already be gone.
    match &result {
        Ok(page) => {
            debug!(page_id = %page_id, "Saved page");
            let _ = ctx.events.send(EditorEvent::Saved(page.clone()));
        }
        Err(e) => {
            error!(page_id = %page_id, error = %e, "Failed to save page");
            let _ = ctx.events.send(EditorEvent::SaveFailed {
                page_id,
                message: e.to_string(),
            });
        }
    }
    result
}
