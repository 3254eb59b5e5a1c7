//! Persisted key index for the disk cache.

use std::path::PathBuf;

use tokio::fs;
use tracing::warn;

use crate::domain::entities::ImageKey;
use crate::domain::ports::{CacheError, CacheResult};

/// Durable, insertion-ordered list of cached keys.
///
/// The index is auxiliary bookkeeping for enumeration: blob existence is
/// always decided by the filesystem, never by this list. It is saved after
/// every mutating store operation.
#[derive(Debug)]
pub struct CacheIndex {
    path: PathBuf,
    keys: Vec<String>,
}

impl CacheIndex {
    /// Loads the index from disk.
    ///
    /// A missing or corrupt file yields an empty index; the store self-heals
    /// from the filesystem as it runs.
    pub async fn load(path: PathBuf) -> Self {
        let keys = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding corrupt cache index");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self { path, keys }
    }

    /// Persists the index.
    ///
    /// # Errors
    /// Returns [`CacheError::Io`] if the file cannot be written.
    pub async fn save(&self) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::Io(format!("failed to create index dir: {e}")))?;
        }

        let content = serde_json::to_string(&self.keys)
            .map_err(|e| CacheError::Io(format!("failed to serialize index: {e}")))?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| CacheError::Io(format!("failed to write index: {e}")))
    }

    /// Records a key if absent. Returns true if the index changed.
    pub fn insert(&mut self, key: &ImageKey) -> bool {
        if self.contains(key.as_str()) {
            return false;
        }
        self.keys.push(key.as_str().to_string());
        true
    }

    /// Removes a key. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    /// Returns true if the key is recorded.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Returns the recorded keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<ImageKey> {
        self.keys.iter().map(|k| ImageKey::new(k.as_str())).collect()
    }

    /// Drops every key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Number of recorded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
