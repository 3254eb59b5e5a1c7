//! HTTP adapter for fetching image bytes.

use std::time::Duration;

use bytes::Bytes;

use crate::domain::ports::{CacheError, CacheResult, ImageFetchPort};

/// Fetches image bytes over HTTP with a per-request timeout.
///
/// Plain GET semantics: any 2xx with a body is a success, everything else is
/// a network error.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher with the given request timeout.
    ///
    /// # Errors
    /// Returns [`CacheError::Network`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> CacheResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> CacheResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::Network(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CacheError::Network(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| CacheError::Network(format!("failed to read body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_creation() {
        assert!(HttpImageFetcher::new(Duration::from_secs(30)).is_ok());
    }
}
