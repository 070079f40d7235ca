//! Filesystem-backed object storage for uploaded images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::ObjectStore;
use crate::error::{Error, Result};

/// Stores objects as files under a root directory.
///
/// An object at `user/name.png` lands at `<root>/user/name.png` and is
/// served from `<base_url>/user/name.png`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    /// Create a store rooted at `root`, publishing under `base_url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            base_url,
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path to its file, rejecting anything that could
    /// escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !is_plain {
            return Err(Error::upload(path, "object path must be relative and plain"));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload_object(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let file_path = self.resolve(path)?;

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Object names are unique; never replace an existing object.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
            .map_err(|e| Error::upload(path, e.to_string()))?;
        file.write_all(bytes)
            .await
            .map_err(|e| Error::upload(path, e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| Error::upload(path, e.to_string()))?;

        debug!(path, size = bytes.len(), "Stored object");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
