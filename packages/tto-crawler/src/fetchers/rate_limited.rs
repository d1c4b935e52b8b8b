//! Per-host rate limiting for any fetcher.
//!
//! Each host gets its own governor bucket so a slow university site does
//! not throttle the others.

use async_trait::async_trait;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::traits::fetcher::Fetcher;
use crate::types::normalize::site_host;
use crate::types::page::PageResult;

/// A fetcher wrapper that waits for a per-host permit before each request.
pub struct RateLimitedFetcher<F: Fetcher> {
    inner: F,
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    /// Limit to `requests_per_second` per host. Zero disables limiting.
    pub fn new(fetcher: F, requests_per_second: u32) -> Self {
        Self {
            inner: fetcher,
            limiter: NonZeroU32::new(requests_per_second)
                .map(|rps| Arc::new(RateLimiter::keyed(Quota::per_second(rps)))),
        }
    }

    /// Create with a custom quota.
    pub fn with_quota(fetcher: F, quota: Quota) -> Self {
        Self {
            inner: fetcher,
            limiter: Some(Arc::new(RateLimiter::keyed(quota))),
        }
    }

    /// Sustained rate plus burst allowance. A zero `burst` is treated as 1.
    pub fn with_burst(fetcher: F, requests_per_second: u32, burst: u32) -> Self {
        let Some(rps) = NonZeroU32::new(requests_per_second) else {
            return Self::new(fetcher, 0);
        };
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(fetcher, Quota::per_second(rps).allow_burst(burst))
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    async fn wait_for_permit(&self, url: &str) {
        if let Some(limiter) = &self.limiter {
            let host = site_host(url).unwrap_or_default();
            limiter.until_key_ready(&host).await;
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult> {
        self.wait_for_permit(url).await;
        self.inner.fetch(url, render_js).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension for wrapping fetchers fluently.
pub trait FetcherExt: Fetcher + Sized {
    /// Wrap with per-host rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::new(self, requests_per_second)
    }
}

impl<F: Fetcher> FetcherExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use std::time::Instant;

    #[tokio::test]
    async fn test_passes_through() {
        let mock = MockFetcher::new().with_page("https://a.edu/x", "<p>ok</p>");
        let fetcher = mock.clone().rate_limited(100);

        let page = fetcher.fetch("https://a.edu/x", false).await.unwrap();
        assert!(page.raw_content.contains("ok"));
        assert_eq!(mock.fetch_count("https://a.edu/x"), 1);
        assert_eq!(fetcher.name(), "mock");
    }

    #[tokio::test]
    async fn test_hosts_are_limited_independently() {
        let mock = MockFetcher::new()
            .with_page("https://a.edu/1", "")
            .with_page("https://b.edu/1", "");
        // one request per second, no burst: a second request to the same
        // host would wait ~1s
        let fetcher = RateLimitedFetcher::new(mock, 1);

        let start = Instant::now();
        fetcher.fetch("https://a.edu/1", false).await.unwrap();
        fetcher.fetch("https://b.edu/1", false).await.unwrap();
        assert!(start.elapsed().as_millis() < 500);
    }

    #[tokio::test]
    async fn test_zero_disables() {
        let fetcher =
            RateLimitedFetcher::new(MockFetcher::new().with_page("https://a.edu/1", ""), 0);
        for _ in 0..5 {
            fetcher.fetch("https://a.edu/1", false).await.unwrap();
        }
    }
}
