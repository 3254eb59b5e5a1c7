//! Gallery configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;

const APP_QUALIFIER: &str = "io";
const APP_ORGANIZATION: &str = "galleria-rs";
const APP_NAME: &str = "galleria";

/// Hard cap on the disk cache, in bytes (100 MiB).
pub const DEFAULT_MAX_DISK_CACHE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum age of a disk cache entry, in seconds (7 days).
pub const DEFAULT_MAX_CACHE_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Maximum entries held by the memory cache.
pub const DEFAULT_MEMORY_CACHE_ENTRIES: usize = 50;

/// Images per feed page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// How close to the feed end a visible index must be to trigger prefetch.
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 5;

/// Tuning knobs for the gallery core.
///
/// All fields have sensible defaults; a config file only needs the keys it
/// wants to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Root directory for the disk cache. Platform cache dir when unset.
    pub cache_dir: Option<PathBuf>,
    /// Hard cap on total blob bytes on disk.
    pub max_disk_cache_size: u64,
    /// Entries older than this are dropped at store startup.
    pub max_cache_age_secs: u64,
    /// Capacity of the in-memory LRU tier, in entries.
    pub memory_cache_entries: usize,
    /// Images per feed page.
    pub page_size: usize,
    /// Prefetch when a visible index is within this many items of the end.
    pub prefetch_threshold: usize,
    /// Concurrent network downloads allowed by the resolver worker.
    pub max_concurrent_fetches: usize,
    /// Per-request HTTP timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Interval between reachability probes in seconds.
    pub probe_interval_secs: u64,
    /// Address the default TCP reachability probe connects to.
    pub probe_addr: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_disk_cache_size: DEFAULT_MAX_DISK_CACHE_SIZE,
            max_cache_age_secs: DEFAULT_MAX_CACHE_AGE_SECS,
            memory_cache_entries: DEFAULT_MEMORY_CACHE_ENTRIES,
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            max_concurrent_fetches: 4,
            fetch_timeout_secs: 30,
            probe_interval_secs: 5,
            probe_addr: "8.8.8.8:53".to_string(),
        }
    }
}

impl GalleryConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing or unparsable file yields the defaults.
    pub async fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path).await {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file");
                Self::default()
            }
        }
    }

    /// Returns the cache root, resolving the platform default when unset.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
            || std::env::temp_dir().join(APP_NAME).join("cache"),
            |dirs| dirs.cache_dir().to_path_buf(),
        )
    }

    /// Directory holding the blob files, one per cached image.
    #[must_use]
    pub fn blob_dir(&self) -> PathBuf {
        self.effective_cache_dir().join("images")
    }

    /// Path of the persisted key index, kept outside the blob directory.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.effective_cache_dir().join("index.json")
    }

    /// Maximum entry age as a [`Duration`].
    #[must_use]
    pub const fn max_cache_age(&self) -> Duration {
        Duration::from_secs(self.max_cache_age_secs)
    }

    /// HTTP request timeout as a [`Duration`].
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Probe interval as a [`Duration`].
    #[must_use]
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    /// Size the disk cache is trimmed down to when it exceeds the hard cap.
    ///
    /// 75% of the cap, so eviction does not thrash at the boundary.
    #[must_use]
    pub const fn disk_evict_target(&self) -> u64 {
        self.max_disk_cache_size / 4 * 3
    }
}
