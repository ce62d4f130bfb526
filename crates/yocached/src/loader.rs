//! File-backed loader for the daemon's cache groups.
//!
//! The daemon's "backing database" is the filesystem: each group reads
//! one file per key under its own directory. Slow, but honest — exactly
//! the kind of source a read-through cache is for.

use std::path::PathBuf;

use tracing::debug;
use yocache::{BoxError, ByteView, Loader};

/// Loads the value for `key` from `{root}/{key}`.
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    /// Create a loader rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl Loader for FileLoader {
    async fn load(&self, key: &str) -> Result<ByteView, BoxError> {
        // Keys are URL path remainders and may contain slashes, but must
        // stay inside the root.
        if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
            return Err(format!("invalid key {key:?}").into());
        }

        let path = self.root.join(key);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(key, path = %path.display(), bytes = data.len(), "loaded from file");
                Ok(ByteView::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(format!("no value for key {key:?}").into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
