//! Fetcher trait: one interface for static and script-rendered retrieval.
//!
//! Callers pass `render_js` per request and never need to know which
//! backend served it.
//!
//! ```rust,ignore
//! use tto_crawler::{Fetcher, HttpFetcher, RoutingFetcher};
//!
//! let fetcher = RoutingFetcher::new(HttpFetcher::new()?);
//! let page = fetcher.fetch("https://tto.example.edu/techs", false).await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::types::page::PageResult;

/// Retrieves pages over the network.
///
/// Implementations must not mutate shared crawl state; their only side
/// effect is network (or renderer) I/O.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one page.
    ///
    /// `render_js` asks for a headless-rendered DOM instead of the raw
    /// server response.
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult>;

    /// Fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult> {
        (**self).fetch(url, render_js).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult> {
        (**self).fetch(url, render_js).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
