//! In-process backend implementing every store trait.
//!
//! Useful for embedding hosts that keep pages in memory and for tests: every
//! request is recorded, any operation can be made to fail, and page updates
//! can be given artificial latency.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{AuthProvider, CurrentUser, ObjectStore, PageStore};
use crate::error::{Error, Result};
use crate::page::{Page, PageId, PageUpdate};

/// A backend request, used for recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_pages`
    ListPages,
    /// `create_page`
    CreatePage,
    /// `update_page`
    UpdatePage,
    /// `delete_page`
    DeletePage,
    /// `upload_object`
    UploadObject,
    /// `sign_out`
    SignOut,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListPages => write!(f, "list_pages"),
            Self::CreatePage => write!(f, "create_page"),
            Self::UpdatePage => write!(f, "update_page"),
            Self::DeletePage => write!(f, "delete_page"),
            Self::UploadObject => write!(f, "upload_object"),
            Self::SignOut => write!(f, "sign_out"),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Pages with their insertion sequence, for stable tie-breaking.
    pages: Vec<(u64, Page)>,
    next_seq: u64,
    objects: HashMap<String, Vec<u8>>,
    calls: Vec<Operation>,
    updates: Vec<(PageId, PageUpdate)>,
    failing: HashSet<Operation>,
    update_latency: VecDeque<Duration>,
    user: Option<CurrentUser>,
}

/// Page, object, and session storage held in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    base_url: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend signed in as user `local`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_user(CurrentUser {
            id: "local".to_string(),
            email: "local@localhost".to_string(),
        })
    }

    /// Create an empty backend signed in as `user`.
    #[must_use]
    pub fn with_user(user: CurrentUser) -> Self {
        Self {
            inner: Mutex::new(Inner {
                user: Some(user),
                ..Inner::default()
            }),
            base_url: "memory://objects".to_string(),
        }
    }

    /// Seed a page as-is, bypassing request recording.
    pub fn insert_page(&self, page: Page) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.pages.push((seq, page));
    }

    /// Make every future call of `op` fail, or succeed again.
    pub fn set_failing(&self, op: Operation, failing: bool) {
        let mut inner = self.lock();
        if failing {
            inner.failing.insert(op);
        } else {
            inner.failing.remove(&op);
        }
    }

    /// Delay the next `update_page` call by `latency`. Queued delays are
    /// consumed one per call, in order.
    pub fn push_update_latency(&self, latency: Duration) {
        self.lock().update_latency.push_back(latency);
    }

    /// Every recorded request, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    /// How many times `op` was requested.
    #[must_use]
    pub fn call_count(&self, op: Operation) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    /// Every update payload received, in call order.
    #[must_use]
    pub fn updates(&self) -> Vec<(PageId, PageUpdate)> {
        self.lock().updates.clone()
    }

    /// A stored page.
    #[must_use]
    pub fn page(&self, id: &PageId) -> Option<Page> {
        self.lock()
            .pages
            .iter()
            .find(|(_, p)| p.id == *id)
            .map(|(_, p)| p.clone())
    }

    /// A stored object's bytes.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(path).cloned()
    }

    /// Paths of all stored objects, sorted.
    #[must_use]
    pub fn object_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.lock().objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding this lock can only come from a test
        // assertion; keep serving the data regardless.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record a request and fail it if `op` is marked failing.
    fn begin(&self, op: Operation) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(op);
        if inner.failing.contains(&op) {
            return Err(Error::backend(format!("{op} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl PageStore for MemoryBackend {
    async fn list_pages(&self, user_id: &str) -> Result<Vec<Page>> {
        self.begin(Operation::ListPages)?;

        let inner = self.lock();
        let mut pages: Vec<_> = inner
            .pages
            .iter()
            .filter(|(_, p)| p.user_id == user_id)
            .collect();
        pages.sort_by(|(a_seq, a), (b_seq, b)| {
            b.updated_at.cmp(&a.updated_at).then(b_seq.cmp(a_seq))
        });
        Ok(pages.into_iter().map(|(_, p)| p.clone()).collect())
    }

    async fn create_page(&self, user_id: &str, title: &str, content: &str) -> Result<Page> {
        self.begin(Operation::CreatePage)?;

        let now = Utc::now();
        let page = Page {
            id: PageId::generate(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.insert_page(page.clone());
        Ok(page)
    }

    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> Result<Page> {
        let latency = {
            let mut inner = self.lock();
            inner.updates.push((id.clone(), update.clone()));
            inner.update_latency.pop_front()
        };
        self.begin(Operation::UpdatePage)?;

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.lock();
        let (_, page) = inner
            .pages
            .iter_mut()
            .find(|(_, p)| p.id == *id)
            .ok_or_else(|| Error::page_not_found(id))?;
        page.title.clone_from(&update.title);
        page.content.clone_from(&update.content);
        page.updated_at = update.updated_at;
        Ok(page.clone())
    }

    async fn delete_page(&self, id: &PageId) -> Result<()> {
        self.begin(Operation::DeletePage)?;

        let mut inner = self.lock();
        let before = inner.pages.len();
        inner.pages.retain(|(_, p)| p.id != *id);
        if inner.pages.len() == before {
            return Err(Error::page_not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload_object(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.begin(Operation::UploadObject)
            .map_err(|e| Error::upload(path, e.to_string()))?;

        let mut inner = self.lock();
        if inner.objects.contains_key(path) {
            return Err(Error::upload(path, "object already exists"));
        }
        inner.objects.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    fn current_user(&self) -> Option<CurrentUser> {
        self.lock().user.clone()
    }

    async fn sign_out(&self) -> Result<()> {
        self.begin(Operation::SignOut)?;
        self.lock().user = None;
        Ok(())
    }
}
