//! Offline-aware pagination over the gallery feed.

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, warn};

use crate::domain::entities::{ImageRef, PageState};
use crate::domain::ports::PageSourcePort;
use crate::infrastructure::image::ImageResolver;
use crate::infrastructure::network::ConnectivityMonitor;

/// Notification published to the feed observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    /// The feed contents changed; `count` is the new total.
    ImagesUpdated {
        /// Number of references now in the feed.
        count: usize,
    },
    /// The user selected the image at `index`.
    ImageSelected {
        /// Index into the feed.
        index: usize,
    },
}

/// Drives which images the gallery wants and in what order.
///
/// Owns the [`PageState`] exclusively; the UI reads through the accessor
/// methods and reacts to [`GalleryEvent`]s.
pub struct GalleryService {
    state: RwLock<PageState>,
    source: Arc<dyn PageSourcePort>,
    resolver: Arc<ImageResolver>,
    monitor: Arc<ConnectivityMonitor>,
    page_size: usize,
    prefetch_threshold: usize,
    event_tx: mpsc::UnboundedSender<GalleryEvent>,
}

impl GalleryService {
    /// Creates the service. Events are published on `event_tx`.
    #[must_use]
    pub fn new(
        source: Arc<dyn PageSourcePort>,
        resolver: Arc<ImageResolver>,
        monitor: Arc<ConnectivityMonitor>,
        page_size: usize,
        prefetch_threshold: usize,
        event_tx: mpsc::UnboundedSender<GalleryEvent>,
    ) -> Self {
        Self {
            state: RwLock::new(PageState::new()),
            source,
            resolver,
            monitor,
            page_size,
            prefetch_threshold,
            event_tx,
        }
    }

    /// Loads (or reloads) the feed from scratch.
    ///
    /// Shows an offline-visible page synthesized from cached keys before any
    /// network page arrives; when disconnected, the cached set is all the
    /// session gets until connectivity returns.
    pub async fn load_images(&self) {
        self.state.write().await.begin_initial_load();

        let cached = self.resolver.cached_keys().await;
        if !cached.is_empty() {
            let refs: Vec<ImageRef> = cached
                .into_iter()
                .map(ImageRef::with_default_dimensions)
                .collect();
            let count = refs.len();
            self.state.write().await.show_cached(refs);
            debug!(count, "Showing cached images before network load");
            self.notify_images_updated(count);
        }

        if !self.monitor.is_connected() {
            self.state.write().await.abort_load();
            debug!("Offline, keeping the cached set");
            return;
        }

        match self.source.fetch_page(1, self.page_size).await {
            Ok(refs) => {
                let count = refs.len();
                self.state.write().await.complete_initial_load(refs);
                debug!(count, "Initial page loaded");
                self.notify_images_updated(count);
            }
            Err(e) => {
                warn!(error = %e, "Initial page load failed");
                self.state.write().await.abort_load();
            }
        }
    }

    /// Appends the next page to the feed.
    ///
    /// A no-op while another load is in flight or while disconnected; at
    /// most one page is ever being appended.
    pub async fn load_more_images(&self) {
        if !self.monitor.is_connected() {
            return;
        }

        let Some(page) = self.state.write().await.begin_load_more() else {
            return;
        };

        match self.source.fetch_page(page, self.page_size).await {
            Ok(refs) => {
                let total = {
                    let mut state = self.state.write().await;
                    state.complete_load_more(page, refs);
                    state.image_count()
                };
                debug!(page, total, "Appended page");
                self.notify_images_updated(total);
            }
            Err(e) => {
                warn!(page, error = %e, "Page load failed");
                self.state.write().await.abort_load();
            }
        }
    }

    /// Returns true when scrolling near `index` should prefetch the next
    /// page: connected, nothing in flight, and the index within the
    /// prefetch threshold of the feed end.
    pub async fn should_load_more(&self, index: usize) -> bool {
        if !self.monitor.is_connected() {
            return false;
        }
        let state = self.state.read().await;
        if state.phase().is_loading() {
            return false;
        }
        index + self.prefetch_threshold >= state.image_count()
    }

    /// Reacts to the network dropping.
    ///
    /// Already-loaded references stay valid offline (resolution falls back
    /// to cache or placeholder per image), so this only rehydrates an empty
    /// feed from cached keys.
    pub async fn handle_offline_transition(&self) {
        if !self.state.read().await.is_empty() {
            return;
        }

        let cached = self.resolver.cached_keys().await;
        if cached.is_empty() {
            return;
        }

        let refs: Vec<ImageRef> = cached
            .into_iter()
            .map(ImageRef::with_default_dimensions)
            .collect();
        let count = refs.len();
        self.state.write().await.show_cached(refs);
        debug!(count, "Rehydrated feed from cached keys after going offline");
        self.notify_images_updated(count);
    }

    /// Reports a selection to the observer.
    pub async fn select_image(&self, index: usize) {
        if index >= self.state.read().await.image_count() {
            return;
        }
        if let Err(e) = self.event_tx.send(GalleryEvent::ImageSelected { index }) {
            error!(error = %e, "Failed to publish selection event");
        }
    }

    /// Returns the reference at `index`, if present.
    pub async fn image(&self, index: usize) -> Option<ImageRef> {
        self.state.read().await.image(index).cloned()
    }

    /// Number of references currently in the feed.
    pub async fn image_count(&self) -> usize {
        self.state.read().await.image_count()
    }

    /// Current page number.
    pub async fn current_page(&self) -> u32 {
        self.state.read().await.current_page()
    }

    /// True once a network page has been loaded this session.
    pub async fn has_loaded_initial(&self) -> bool {
        self.state.read().await.has_loaded_initial()
    }

    /// True while the network is considered unreachable.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        !self.monitor.is_connected()
    }

    fn notify_images_updated(&self, count: usize) {
        if let Err(e) = self.event_tx.send(GalleryEvent::ImagesUpdated { count }) {
            error!(error = %e, "Failed to publish feed update");
        }
    }
}

impl std::fmt::Debug for GalleryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryService")
            .field("page_size", &self.page_size)
            .field("prefetch_threshold", &self.prefetch_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_case::test_case;

    use super::*;
    use crate::domain::entities::{ConnectivityState, ImageKey};
    use crate::domain::ports::mocks::{MockFetcher, MockProbe, SlowPageSource};
    use crate::infrastructure::image::{DiskCacheStore, MemoryImageCache};

    struct Fixture {
        service: Arc<GalleryService>,
        source: Arc<SlowPageSource>,
        monitor: Arc<ConnectivityMonitor>,
        disk: Arc<DiskCacheStore>,
        events: mpsc::UnboundedReceiver<GalleryEvent>,
        _temp: tempfile::TempDir,
    }

    async fn fixture(source_delay: Duration) -> Fixture {
        let temp = tempfile::TempDir::new().unwrap();
        let disk = Arc::new(
            DiskCacheStore::new(
                temp.path().join("images"),
                temp.path().join("index.json"),
                1024 * 1024,
                Duration::from_secs(3600),
            )
            .await
            .unwrap(),
        );
        let memory = Arc::new(MemoryImageCache::new(10));
        let monitor = Arc::new(ConnectivityMonitor::new(
            Arc::new(MockProbe::new(true)),
            Duration::from_secs(60),
        ));
        let (resolved_tx, _resolved_rx) = mpsc::unbounded_channel();
        let resolver = Arc::new(ImageResolver::new(
            memory,
            disk.clone(),
            Arc::new(MockFetcher::failing()),
            monitor.clone(),
            2,
            resolved_tx,
        ));

        let source = Arc::new(SlowPageSource::new(source_delay));
        let (event_tx, events) = mpsc::unbounded_channel();
        let service = Arc::new(GalleryService::new(
            source.clone(),
            resolver,
            monitor.clone(),
            20,
            5,
            event_tx,
        ));

        Fixture {
            service,
            source,
            monitor,
            disk,
            events,
            _temp: temp,
        }
    }

    #[tokio::test]
    async fn test_initial_load_fills_first_page() {
        let mut fx = fixture(Duration::ZERO).await;

        fx.service.load_images().await;

        assert_eq!(fx.service.image_count().await, 20);
        assert_eq!(fx.service.current_page().await, 1);
        assert!(fx.service.has_loaded_initial().await);
        assert_eq!(fx.service.image(0).await.unwrap().key().as_str(), "1");
        assert_eq!(fx.service.image(19).await.unwrap().key().as_str(), "20");
        assert_eq!(
            fx.events.recv().await,
            Some(GalleryEvent::ImagesUpdated { count: 20 })
        );
    }

    #[tokio::test]
    async fn test_load_more_appends_next_page() {
        let fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;

        fx.service.load_more_images().await;

        assert_eq!(fx.service.image_count().await, 40);
        assert_eq!(fx.service.current_page().await, 2);
        // Page 2 starts where page 1 ended: no gap, no overlap.
        assert_eq!(fx.service.image(20).await.unwrap().key().as_str(), "21");
        assert_eq!(fx.service.image(39).await.unwrap().key().as_str(), "40");
    }

    #[tokio::test]
    async fn test_rapid_double_load_more_appends_one_page() {
        let fx = fixture(Duration::from_millis(50)).await;
        fx.service.load_images().await;
        assert_eq!(fx.source.call_count(), 1);

        tokio::join!(
            fx.service.load_more_images(),
            fx.service.load_more_images()
        );

        // The second call was a no-op while the first was in flight.
        assert_eq!(fx.service.image_count().await, 40);
        assert_eq!(fx.service.current_page().await, 2);
        assert_eq!(fx.source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_load_more_is_noop_offline() {
        let fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;

        fx.monitor.apply_observation(ConnectivityState::offline());
        fx.service.load_more_images().await;

        assert_eq!(fx.service.image_count().await, 20);
        assert_eq!(fx.source.call_count(), 1);
    }

    #[test_case(16, true ; "near_the_end")]
    #[test_case(15, true ; "at_the_threshold")]
    #[test_case(14, false ; "before_the_threshold")]
    #[test_case(0, false ; "far_from_the_end")]
    #[tokio::test]
    async fn test_should_load_more_by_index(index: usize, expected: bool) {
        let fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;

        assert_eq!(fx.service.should_load_more(index).await, expected);
    }

    #[tokio::test]
    async fn test_should_load_more_false_offline() {
        let fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;

        fx.monitor.apply_observation(ConnectivityState::offline());
        assert!(!fx.service.should_load_more(16).await);
    }

    #[tokio::test]
    async fn test_should_load_more_false_while_loading() {
        let fx = fixture(Duration::from_millis(50)).await;
        fx.service.load_images().await;

        let service = fx.service.clone();
        let in_flight = tokio::spawn(async move { service.load_more_images().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!fx.service.should_load_more(16).await);
        in_flight.await.unwrap();
    }

    #[tokio::test]
    async fn test_offline_bootstrap_from_cached_keys() {
        let fx = fixture(Duration::ZERO).await;
        fx.disk.put(&ImageKey::new("11"), b"a").await;
        fx.disk.put(&ImageKey::new("12"), b"b").await;
        fx.monitor.apply_observation(ConnectivityState::offline());

        fx.service.load_images().await;

        // Only the cached set is visible; the network was never asked.
        assert_eq!(fx.service.image_count().await, 2);
        assert!(!fx.service.has_loaded_initial().await);
        assert_eq!(fx.source.call_count(), 0);

        let first = fx.service.image(0).await.unwrap();
        assert_eq!(first.key().as_str(), "11");
        assert_eq!(first.width(), 400);
        assert_eq!(first.height(), 400);
    }

    #[tokio::test]
    async fn test_connected_load_replaces_bootstrap_with_page_one() {
        let mut fx = fixture(Duration::ZERO).await;
        fx.disk.put(&ImageKey::new("99"), b"a").await;

        fx.service.load_images().await;

        // Bootstrap event first, then the real page.
        assert_eq!(
            fx.events.recv().await,
            Some(GalleryEvent::ImagesUpdated { count: 1 })
        );
        assert_eq!(
            fx.events.recv().await,
            Some(GalleryEvent::ImagesUpdated { count: 20 })
        );
        assert_eq!(fx.service.image(0).await.unwrap().key().as_str(), "1");
    }

    #[tokio::test]
    async fn test_offline_transition_rehydrates_empty_feed() {
        let fx = fixture(Duration::ZERO).await;
        fx.disk.put(&ImageKey::new("5"), b"a").await;
        fx.monitor.apply_observation(ConnectivityState::offline());

        fx.service.handle_offline_transition().await;

        assert_eq!(fx.service.image_count().await, 1);
        assert!(fx.service.is_offline());
    }

    #[tokio::test]
    async fn test_offline_transition_keeps_loaded_feed() {
        let fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;
        fx.disk.put(&ImageKey::new("cached"), b"a").await;

        fx.monitor.apply_observation(ConnectivityState::offline());
        fx.service.handle_offline_transition().await;

        // The 20 loaded references stay; no rehydration happened.
        assert_eq!(fx.service.image_count().await, 20);
        assert_eq!(fx.service.image(0).await.unwrap().key().as_str(), "1");
    }

    #[tokio::test]
    async fn test_reload_resets_feed() {
        let fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;
        fx.service.load_more_images().await;
        assert_eq!(fx.service.image_count().await, 40);

        fx.service.load_images().await;

        assert_eq!(fx.service.image_count().await, 20);
        assert_eq!(fx.service.current_page().await, 1);
    }

    #[tokio::test]
    async fn test_select_image_emits_event() {
        let mut fx = fixture(Duration::ZERO).await;
        fx.service.load_images().await;
        let _ = fx.events.recv().await;

        fx.service.select_image(3).await;
        assert_eq!(
            fx.events.recv().await,
            Some(GalleryEvent::ImageSelected { index: 3 })
        );

        // Out of bounds is swallowed.
        fx.service.select_image(500).await;
        assert!(fx.events.try_recv().is_err());
    }
}
