//! Sequential page synthesis for the backing image source.

use crate::domain::entities::ImageRef;
use crate::domain::ports::{CacheResult, PageSourcePort};

/// Default page source: synthesizes sequential numeric keys.
///
/// Page `p` covers the keys `(p-1)*page_size + 1 ..= p*page_size`, 1-indexed
/// inclusive on both ends, so consecutive pages neither gap nor overlap.
pub struct SequentialPageSource;

#[async_trait::async_trait]
impl PageSourcePort for SequentialPageSource {
    async fn fetch_page(&self, page: u32, page_size: usize) -> CacheResult<Vec<ImageRef>> {
        // Pages are 1-indexed.
        if page == 0 {
            return Ok(Vec::new());
        }
        let start = u64::from(page - 1) * page_size as u64 + 1;
        let end = u64::from(page) * page_size as u64;
        Ok((start..=end)
            .map(|i| ImageRef::with_default_dimensions(i.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(1, 20, "1", "20" ; "first_page")]
    #[test_case(2, 20, "21", "40" ; "second_page")]
    #[test_case(3, 7, "15", "21" ; "odd_page_size")]
    #[tokio::test]
    async fn test_page_bounds(page: u32, size: usize, first: &str, last: &str) {
        let refs = SequentialPageSource.fetch_page(page, size).await.unwrap();
        assert_eq!(refs.len(), size);
        assert_eq!(refs.first().unwrap().key().as_str(), first);
        assert_eq!(refs.last().unwrap().key().as_str(), last);
    }

    #[tokio::test]
    async fn test_consecutive_pages_neither_gap_nor_overlap() {
        let one = SequentialPageSource.fetch_page(1, 20).await.unwrap();
        let two = SequentialPageSource.fetch_page(2, 20).await.unwrap();

        let all: Vec<u64> = one
            .iter()
            .chain(two.iter())
            .map(|r| r.key().as_str().parse().unwrap())
            .collect();
        let expected: Vec<u64> = (1..=40).collect();
        assert_eq!(all, expected);
    }

    #[tokio::test]
    async fn test_page_zero_is_empty() {
        let refs = SequentialPageSource.fetch_page(0, 20).await.unwrap();
        assert!(refs.is_empty());
    }
}
