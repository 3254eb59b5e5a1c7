//! Disk-backed image cache with a persisted key index.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageKey;
use crate::domain::ports::{CacheError, CacheResult};

use super::cache_index::CacheIndex;
use super::source_url::blob_stem;

/// File extension for cached blobs.
const BLOB_EXT: &str = "jpg";

/// Durable, size- and age-bounded blob store for encoded images.
///
/// One file per image under `blob_dir`, named by the hashed key; the index
/// lives in its own file outside that directory and enumerates known keys.
/// The filesystem, not the index, is the source of truth for existence: a
/// blob that vanished is simply a miss, and the startup expiry pass brings
/// the two back in lockstep.
///
/// All mutating operations serialize on the index mutex; reads go straight
/// to the filesystem.
pub struct DiskCacheStore {
    blob_dir: PathBuf,
    max_size: u64,
    index: Mutex<CacheIndex>,
}

impl DiskCacheStore {
    /// Opens the store, creating the blob directory, loading the index, and
    /// running the one-time age-eviction pass.
    ///
    /// # Errors
    /// Returns [`CacheError::Io`] if the blob directory cannot be created.
    pub async fn new(
        blob_dir: PathBuf,
        index_path: PathBuf,
        max_size: u64,
        max_age: Duration,
    ) -> CacheResult<Self> {
        fs::create_dir_all(&blob_dir)
            .await
            .map_err(|e| CacheError::Io(format!("failed to create cache dir: {e}")))?;

        let index = CacheIndex::load(index_path).await;
        let store = Self {
            blob_dir,
            max_size,
            index: Mutex::new(index),
        };

        store.evict_expired(max_age).await;

        Ok(store)
    }

    /// Returns the blob path for a key.
    fn blob_path(&self, key: &ImageKey) -> PathBuf {
        self.blob_dir.join(format!("{}.{BLOB_EXT}", blob_stem(key)))
    }

    /// Writes a blob and records its key.
    ///
    /// Re-putting an existing key overwrites the blob and leaves the index
    /// untouched. Write failures are logged and swallowed: caching is
    /// best-effort and the entry is simply absent afterward.
    pub async fn put(&self, key: &ImageKey, bytes: &[u8]) {
        let mut index = self.index.lock().await;
        let path = self.blob_path(key);

        if let Err(e) = fs::write(&path, bytes).await {
            warn!(key = %key, error = %e, "Failed to write cache blob");
            // Drop any partially written blob.
            let _ = fs::remove_file(&path).await;
            return;
        }

        if index.insert(key)
            && let Err(e) = index.save().await
        {
            warn!(key = %key, error = %e, "Failed to persist cache index");
        }

        debug!(key = %key, size = bytes.len(), "Stored image in disk cache");
    }

    /// Returns blob bytes if the file exists.
    ///
    /// Existence is decided by the filesystem directly; the index is never
    /// consulted here.
    pub async fn get(&self, key: &ImageKey) -> Option<Bytes> {
        match fs::read(self.blob_path(key)).await {
            Ok(bytes) => {
                trace!(key = %key, "Disk cache hit");
                Some(Bytes::from(bytes))
            }
            Err(_) => {
                trace!(key = %key, "Disk cache miss");
                None
            }
        }
    }

    /// Returns true if the blob file exists.
    pub async fn exists(&self, key: &ImageKey) -> bool {
        fs::try_exists(self.blob_path(key)).await.unwrap_or(false)
    }

    /// Sum of all blob file sizes. An O(entries) directory scan each call.
    pub async fn total_size(&self) -> u64 {
        self.scan_blobs().await.iter().map(|(_, _, size)| size).sum()
    }

    /// Returns the indexed keys in insertion order.
    pub async fn list_keys(&self) -> Vec<ImageKey> {
        self.index.lock().await.keys()
    }

    /// Deletes every blob and empties the index.
    pub async fn clear_all(&self) {
        let mut index = self.index.lock().await;

        for (path, _, _) in self.scan_blobs().await {
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove cache blob");
            }
        }

        index.clear();
        if let Err(e) = index.save().await {
            warn!(error = %e, "Failed to persist cleared cache index");
        }
        debug!("Cleared disk cache");
    }

    /// Removes entries older than `max_age` and repairs index/filesystem
    /// drift in the same pass: keys without a blob are dropped, blobs
    /// without a key are deleted.
    ///
    /// Runs once when the store opens; a staleness window between runs is
    /// accepted.
    pub async fn evict_expired(&self, max_age: Duration) {
        let mut index = self.index.lock().await;
        let now = SystemTime::now();
        let mut changed = false;
        let mut live_stems = HashSet::new();

        for key in index.keys() {
            let path = self.blob_path(&key);
            let meta = match fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(_) => {
                    // Blob vanished underneath us; the key is stale.
                    index.remove(key.as_str());
                    changed = true;
                    continue;
                }
            };

            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let expired = now
                .duration_since(modified)
                .is_ok_and(|age| age > max_age);

            if expired {
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(key = %key, error = %e, "Failed to remove expired blob");
                    live_stems.insert(blob_stem(&key));
                } else {
                    debug!(key = %key, "Removed expired cache entry");
                    index.remove(key.as_str());
                    changed = true;
                }
            } else {
                live_stems.insert(blob_stem(&key));
            }
        }

        for (path, _, _) in self.scan_blobs().await {
            let known = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| live_stems.contains(stem));
            if !known {
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Failed to remove orphan blob");
                } else {
                    debug!(path = %path.display(), "Removed orphan blob");
                }
            }
        }

        if changed
            && let Err(e) = index.save().await
        {
            warn!(error = %e, "Failed to persist cache index after expiry pass");
        }
    }

    /// Deletes oldest blobs first until total size is at or below `target`.
    pub async fn evict_to_fit(&self, target: u64) {
        let mut index = self.index.lock().await;

        let mut files = self.scan_blobs().await;
        let mut total: u64 = files.iter().map(|(_, _, size)| size).sum();
        if total <= target {
            return;
        }
        files.sort_by_key(|(_, modified, _)| *modified);

        let stem_to_key: HashMap<String, String> = index
            .keys()
            .iter()
            .map(|k| (blob_stem(k), k.as_str().to_string()))
            .collect();

        let mut freed = 0u64;
        let mut removed = 0usize;
        let mut changed = false;

        for (path, _, size) in files {
            if total <= target {
                break;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    total -= size;
                    freed += size;
                    removed += 1;
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                        && let Some(key) = stem_to_key.get(stem)
                    {
                        index.remove(key);
                        changed = true;
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to evict cache blob");
                }
            }
        }

        if changed
            && let Err(e) = index.save().await
        {
            warn!(error = %e, "Failed to persist cache index after eviction");
        }

        debug!(freed, removed, "Size-based eviction complete");
    }

    /// Trims the cache to 75% of the hard cap when the cap is exceeded.
    ///
    /// The resolver calls this after every network-fill.
    pub async fn enforce_size_limit(&self) {
        let total = self.total_size().await;
        if total <= self.max_size {
            return;
        }
        debug!(
            total,
            max = self.max_size,
            "Disk cache over limit, evicting"
        );
        self.evict_to_fit(self.max_size / 4 * 3).await;
    }

    /// Lists blob files with their modification time and size.
    async fn scan_blobs(&self) -> Vec<(PathBuf, SystemTime, u64)> {
        let mut files = Vec::new();
        let Ok(mut entries) = fs::read_dir(&self.blob_dir).await else {
            return files;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != BLOB_EXT) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, modified, meta.len()));
            }
        }

        files
    }
}
