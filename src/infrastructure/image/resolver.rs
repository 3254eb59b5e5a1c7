//! Tiered image resolution: memory, disk, then network.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{RwLock, Semaphore, mpsc};
use tracing::{debug, error, trace, warn};

use crate::domain::entities::{ImageKey, ImageOrigin, ImageRef, ResolveOutcome, ResolvedImage};
use crate::domain::ports::{CacheError, CacheResult, ImageCachePort, ImageFetchPort};
use crate::infrastructure::network::ConnectivityMonitor;

use super::disk_cache::DiskCacheStore;
use super::memory_cache::MemoryImageCache;
use super::source_url::source_url;

/// Quality used when normalizing fetched images to JPEG for caching.
const JPEG_QUALITY: u8 = 80;

/// Message sent when a background resolution finishes.
#[derive(Debug, Clone)]
pub struct ImageResolvedEvent {
    /// The key that was resolved.
    pub key: ImageKey,
    /// What the resolution produced.
    pub outcome: ResolveOutcome,
}

#[derive(Debug)]
enum ResolverCommand {
    Resolve(ImageRef),
    Cancel(ImageKey),
    CancelAll,
}

/// Resolves image references through the cache tiers.
///
/// Every resolution is independent and idempotent; concurrent resolutions of
/// the same key may race on cache population with last-write-wins semantics,
/// which is benign because the bytes come from the same source.
pub struct ImageResolver {
    core: Arc<ResolverCore>,
    pending: Arc<RwLock<HashSet<ImageKey>>>,
    request_tx: mpsc::UnboundedSender<ResolverCommand>,
}

/// Shared tier-chain state, used by both the direct and the worker path.
struct ResolverCore {
    memory: Arc<MemoryImageCache>,
    disk: Arc<DiskCacheStore>,
    fetcher: Arc<dyn ImageFetchPort>,
    monitor: Arc<ConnectivityMonitor>,
}

/// State for the background worker loop.
struct WorkerState {
    core: Arc<ResolverCore>,
    pending: Arc<RwLock<HashSet<ImageKey>>>,
    event_tx: mpsc::UnboundedSender<ImageResolvedEvent>,
    semaphore: Arc<Semaphore>,
    request_rx: mpsc::UnboundedReceiver<ResolverCommand>,
}

impl ImageResolver {
    /// Creates the resolver and spawns its request worker.
    #[must_use]
    pub fn new(
        memory: Arc<MemoryImageCache>,
        disk: Arc<DiskCacheStore>,
        fetcher: Arc<dyn ImageFetchPort>,
        monitor: Arc<ConnectivityMonitor>,
        max_concurrent_fetches: usize,
        event_tx: mpsc::UnboundedSender<ImageResolvedEvent>,
    ) -> Self {
        let core = Arc::new(ResolverCore {
            memory,
            disk,
            fetcher,
            monitor,
        });
        let pending = Arc::new(RwLock::new(HashSet::new()));
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let worker = WorkerState {
            core: core.clone(),
            pending: pending.clone(),
            event_tx,
            semaphore: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
            request_rx,
        };
        tokio::spawn(Self::run_worker_loop(worker));

        Self {
            core,
            pending,
            request_tx,
        }
    }

    /// Resolves one reference, returning at the first tier that answers.
    pub async fn resolve(&self, image: &ImageRef) -> ResolveOutcome {
        self.core.resolve(image).await
    }

    /// Queues a reference for background resolution.
    ///
    /// The outcome arrives on the event channel. Requests already queued for
    /// the same key are collapsed.
    pub fn request(&self, image: ImageRef) {
        if let Err(e) = self.request_tx.send(ResolverCommand::Resolve(image)) {
            error!(error = %e, "Failed to queue resolve request");
        }
    }

    /// Queues several references, e.g. a page worth of prefetch.
    pub fn prefetch_batch(&self, images: Vec<ImageRef>) {
        for image in images {
            self.request(image);
        }
    }

    /// Drops a queued request for the key. In-flight work is not interrupted.
    pub fn cancel(&self, key: &ImageKey) {
        if let Err(e) = self.request_tx.send(ResolverCommand::Cancel(key.clone())) {
            error!(error = %e, "Failed to queue cancel request");
        }
    }

    /// Drops every queued request.
    pub fn cancel_all(&self) {
        if let Err(e) = self.request_tx.send(ResolverCommand::CancelAll) {
            error!(error = %e, "Failed to queue cancel-all request");
        }
    }

    /// Returns true while a background resolution for the key is running.
    pub async fn is_pending(&self, key: &ImageKey) -> bool {
        self.pending.read().await.contains(key)
    }

    /// Number of background resolutions currently running.
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Keys with entries in the disk cache, in insertion order.
    ///
    /// Feeds the offline bootstrap: these are the images showable with no
    /// network at all.
    pub async fn cached_keys(&self) -> Vec<ImageKey> {
        self.core.disk.list_keys().await
    }

    /// Returns memory-tier statistics.
    #[must_use]
    pub fn memory_stats(&self) -> super::memory_cache::CacheStats {
        self.core.memory.stats()
    }

    /// Clears both cache tiers.
    pub async fn clear_all(&self) {
        self.core.memory.clear().await;
        self.core.disk.clear_all().await;
        debug!("Cleared all image caches");
    }

    /// Worker loop: drains commands, throttles downloads via the semaphore.
    async fn run_worker_loop(mut state: WorkerState) {
        let mut queue: VecDeque<ImageRef> = VecDeque::new();

        loop {
            tokio::select! {
                cmd = state.request_rx.recv() => {
                    match cmd {
                        Some(ResolverCommand::Resolve(image)) => {
                            if !queue.iter().any(|q| q.key() == image.key()) {
                                // Newest request first.
                                queue.push_front(image);
                            }
                        }
                        Some(ResolverCommand::Cancel(key)) => {
                            queue.retain(|q| q.key() != &key);
                        }
                        Some(ResolverCommand::CancelAll) => {
                            queue.clear();
                        }
                        None => break,
                    }
                }
                Ok(permit) = state.semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    if let Some(image) = queue.pop_front() {
                        let core = state.core.clone();
                        let pending = state.pending.clone();
                        let event_tx = state.event_tx.clone();

                        tokio::spawn(async move {
                            let key = image.key().clone();
                            {
                                let mut guard = pending.write().await;
                                if !guard.insert(key.clone()) {
                                    return;
                                }
                            }

                            let outcome = core.resolve(&image).await;

                            pending.write().await.remove(&key);
                            let _ = event_tx.send(ImageResolvedEvent { key, outcome });
                            drop(permit);
                        });
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver").finish_non_exhaustive()
    }
}

impl ResolverCore {
    async fn resolve(&self, image: &ImageRef) -> ResolveOutcome {
        let key = image.key();

        if let Some(bytes) = self.memory.get(key).await {
            trace!(key = %key, "Resolved from memory");
            return resolved(key, bytes, ImageOrigin::Memory);
        }

        if let Some(bytes) = self.disk.get(key).await {
            // Write-through on read: repeat visits skip disk I/O.
            self.memory.put(key.clone(), bytes.clone()).await;
            trace!(key = %key, "Resolved from disk");
            return resolved(key, bytes, ImageOrigin::Disk);
        }

        if !self.monitor.is_connected() {
            debug!(key = %key, "Offline and not cached, returning placeholder");
            return ResolveOutcome::OfflinePlaceholder;
        }

        let url = source_url(image);
        debug!(key = %key, url = %url, "Downloading image");

        let raw = match self.fetcher.fetch(&url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Image fetch failed");
                return ResolveOutcome::ErrorPlaceholder {
                    reason: e.to_string(),
                };
            }
        };

        let encoded = match normalize_jpeg(raw).await {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %key, error = %e, "Image decode failed");
                return ResolveOutcome::ErrorPlaceholder {
                    reason: e.to_string(),
                };
            }
        };

        // Write-through to both tiers; a disk failure is logged inside the
        // store and must not fail the resolution.
        self.memory.put(key.clone(), encoded.clone()).await;
        self.disk.put(key, &encoded).await;
        self.disk.enforce_size_limit().await;

        debug!(key = %key, size = encoded.len(), "Image resolved from network");
        resolved(key, encoded, ImageOrigin::Network)
    }
}

fn resolved(key: &ImageKey, bytes: Bytes, origin: ImageOrigin) -> ResolveOutcome {
    ResolveOutcome::Resolved(ResolvedImage {
        key: key.clone(),
        bytes,
        origin,
    })
}

/// Validates fetched bytes as an image and re-encodes them as baseline JPEG,
/// the stable on-disk format, on the blocking pool.
async fn normalize_jpeg(raw: Bytes) -> CacheResult<Bytes> {
    tokio::task::spawn_blocking(move || -> CacheResult<Bytes> {
        let decoded = image::load_from_memory(&raw)
            .map_err(|e| CacheError::Decode(format!("failed to decode image: {e}")))?;
        let rgb = decoded.to_rgb8();

        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
        encoder
            .encode_image(&rgb)
            .map_err(|e| CacheError::Decode(format!("failed to encode jpeg: {e}")))?;
        Ok(Bytes::from(out))
    })
    .await
    .map_err(|e| CacheError::Decode(format!("decode task panicked: {e}")))?
}
