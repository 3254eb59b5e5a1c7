//! Port definition for the paged image listing source.

use crate::domain::entities::ImageRef;

use super::image_cache_port::CacheResult;

/// Port for fetching one page of image references from the backing source.
///
/// Page numbering is 1-indexed; page `p` covers the references
/// `[(p-1)*page_size + 1, p*page_size]` inclusive.
#[async_trait::async_trait]
pub trait PageSourcePort: Send + Sync {
    /// Fetches the references for `page`.
    ///
    /// # Errors
    /// Returns [`CacheError::Network`](super::CacheError::Network) when the
    /// listing cannot be obtained.
    async fn fetch_page(&self, page: u32, page_size: usize) -> CacheResult<Vec<ImageRef>>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Mock page source with a configurable per-fetch delay, so tests can
    /// hold a load in flight deterministically.
    pub struct SlowPageSource {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl SlowPageSource {
        /// Creates a mock that sleeps for `delay` before serving each page.
        pub fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of pages served.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PageSourcePort for SlowPageSource {
        async fn fetch_page(&self, page: u32, page_size: usize) -> CacheResult<Vec<ImageRef>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let start = u64::from(page - 1) * page_size as u64 + 1;
            let end = u64::from(page) * page_size as u64;
            Ok((start..=end)
                .map(|i| ImageRef::with_default_dimensions(i.to_string()))
                .collect())
        }
    }
}
