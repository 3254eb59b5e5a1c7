//! Port definition for image byte caching.

use bytes::Bytes;

use crate::domain::entities::ImageKey;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while acquiring or caching image bytes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Key not present in any cache tier. A normal outcome, not a failure.
    #[error("image not found: {0}")]
    NotFound(String),
    /// Bytes are not a decodable image.
    #[error("decode error: {0}")]
    Decode(String),
    /// Disk read/write/delete failure.
    #[error("io error: {0}")]
    Io(String),
    /// Transport failure, non-2xx response, or timeout.
    #[error("network error: {0}")]
    Network(String),
}

impl CacheError {
    /// Returns true for failures the resolver surfaces as an error placeholder.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Network(_))
    }
}

/// Port for the in-memory byte cache tier.
///
/// Implementations must be thread-safe. A miss here is never authoritative;
/// callers always fall through to slower tiers.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Gets bytes from the cache, promoting the entry as recently used.
    async fn get(&self, key: &ImageKey) -> Option<Bytes>;

    /// Stores bytes in the cache.
    async fn put(&self, key: ImageKey, bytes: Bytes);

    /// Removes an entry from the cache.
    async fn evict(&self, key: &ImageKey);

    /// Returns the current number of cached entries.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries.
    async fn clear(&self);
}
