//! `pagenotes` - Page-based note taking with debounced autosave
//!
//! This library provides the controllers behind a notes UI: a list of the
//! signed-in user's pages and an editor that coalesces bursts of edits into
//! single saves, uploads images into the page, and reports every save back
//! to the list. Persistence, object storage, and authentication sit behind
//! the traits in [`store`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod autosave;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod interaction;
pub mod list;
pub mod logging;
pub mod page;
pub mod store;
pub mod surface;
pub mod upload;

pub use config::Config;
pub use dashboard::{Dashboard, Services};
pub use editor::{EditorContext, EditorEvent, EditorSettings, PageEditor};
pub use error::{Error, Result};
pub use interaction::{Interaction, Notice, NoticeLevel};
pub use list::PageList;
pub use logging::init_logging;
pub use page::{Page, PageId, PageUpdate};
pub use surface::{EditableSurface, FormatCommand, MarkupSurface};
pub use upload::ImageFile;
