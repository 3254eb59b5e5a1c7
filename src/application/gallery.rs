//! Composition root for the gallery core.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::domain::ports::CacheResult;
use crate::infrastructure::config::GalleryConfig;
use crate::infrastructure::image::{
    DiskCacheStore, ImageResolvedEvent, ImageResolver, MemoryImageCache,
};
use crate::infrastructure::network::{ConnectivityMonitor, HttpImageFetcher, TcpProbe};

use super::services::{GalleryEvent, GalleryService, SequentialPageSource};

/// Timeout for one reachability probe attempt.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Receivers for the notifications the core publishes.
pub struct GalleryEvents {
    /// Feed changes and selections.
    pub gallery: mpsc::UnboundedReceiver<GalleryEvent>,
    /// Background image resolutions.
    pub images: mpsc::UnboundedReceiver<ImageResolvedEvent>,
}

/// The assembled gallery core.
///
/// Construction is the single place services are created and injected;
/// nothing in the crate is globally reachable. Lifetime is the caller's
/// decision — typically once per process.
pub struct Gallery {
    service: Arc<GalleryService>,
    resolver: Arc<ImageResolver>,
    monitor: Arc<ConnectivityMonitor>,
}

impl Gallery {
    /// Wires up the core and starts its background tasks.
    ///
    /// Opening the disk store runs the one-time age-eviction pass.
    ///
    /// # Errors
    /// Returns [`CacheError::Io`](crate::domain::ports::CacheError::Io) if
    /// the cache directory cannot be created, or
    /// [`CacheError::Network`](crate::domain::ports::CacheError::Network) if
    /// the HTTP client cannot be built.
    pub async fn start(config: GalleryConfig) -> CacheResult<(Self, GalleryEvents)> {
        let disk = Arc::new(
            DiskCacheStore::new(
                config.blob_dir(),
                config.index_path(),
                config.max_disk_cache_size,
                config.max_cache_age(),
            )
            .await?,
        );
        let memory = Arc::new(MemoryImageCache::new(config.memory_cache_entries));

        let monitor = Arc::new(ConnectivityMonitor::new(
            Arc::new(TcpProbe::new(config.probe_addr.clone(), PROBE_TIMEOUT)),
            config.probe_interval(),
        ));
        monitor.start();

        let fetcher = Arc::new(HttpImageFetcher::new(config.fetch_timeout())?);

        let (image_tx, image_rx) = mpsc::unbounded_channel();
        let resolver = Arc::new(ImageResolver::new(
            memory,
            disk,
            fetcher,
            monitor.clone(),
            config.max_concurrent_fetches,
            image_tx,
        ));

        let (gallery_tx, gallery_rx) = mpsc::unbounded_channel();
        let service = Arc::new(GalleryService::new(
            Arc::new(SequentialPageSource),
            resolver.clone(),
            monitor.clone(),
            config.page_size,
            config.prefetch_threshold,
            gallery_tx,
        ));

        info!(cache_dir = %config.effective_cache_dir().display(), "Gallery core started");

        Ok((
            Self {
                service,
                resolver,
                monitor,
            },
            GalleryEvents {
                gallery: gallery_rx,
                images: image_rx,
            },
        ))
    }

    /// The pagination service the UI drives.
    #[must_use]
    pub fn service(&self) -> &Arc<GalleryService> {
        &self.service
    }

    /// The tiered image resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<ImageResolver> {
        &self.resolver
    }

    /// The connectivity monitor, e.g. to subscribe to transitions.
    #[must_use]
    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    /// Stops the background observation loop. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }
}
