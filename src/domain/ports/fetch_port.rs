//! Port definition for fetching image bytes over the network.

use bytes::Bytes;

use super::image_cache_port::CacheResult;

/// Port for the network transport: fetch bytes from a URL.
///
/// Standard HTTP GET semantics; any 2xx with a body is success.
#[async_trait::async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches the body at `url`.
    ///
    /// # Errors
    /// Returns [`CacheError::Network`](super::CacheError::Network) on
    /// transport failure or a non-2xx status.
    async fn fetch(&self, url: &str) -> CacheResult<Bytes>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::domain::ports::CacheError;

    /// Mock fetcher serving fixed bytes, with a failure switch and a call
    /// counter so tests can prove the network was (not) consulted.
    pub struct MockFetcher {
        body: Bytes,
        should_succeed: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        /// Creates a mock that serves `body` on every fetch.
        pub fn serving(body: impl Into<Bytes>) -> Self {
            Self {
                body: body.into(),
                should_succeed: AtomicBool::new(true),
                calls: AtomicUsize::new(0),
            }
        }

        /// Creates a mock that fails every fetch.
        pub fn failing() -> Self {
            let mock = Self::serving(Bytes::new());
            mock.should_succeed.store(false, Ordering::SeqCst);
            mock
        }

        /// Sets success behavior.
        pub fn set_should_succeed(&self, value: bool) {
            self.should_succeed.store(value, Ordering::SeqCst);
        }

        /// Number of fetches performed.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ImageFetchPort for MockFetcher {
        async fn fetch(&self, _url: &str) -> CacheResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_succeed.load(Ordering::SeqCst) {
                Ok(self.body.clone())
            } else {
                Err(CacheError::Network("mock transport failure".to_string()))
            }
        }
    }
}
