//! Configuration types for crawling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A site to crawl: name plus seed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSeed {
    /// Site name, used as the frontier partition key
    pub name: String,

    /// Seed URL (first listing page)
    pub url: String,

    /// Whether pages of this site need script rendering
    #[serde(default)]
    pub render_js: bool,
}

impl SiteSeed {
    /// Create a seed for a statically served site.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            render_js: false,
        }
    }

    /// Mark the site as needing script rendering.
    pub fn rendered(mut self) -> Self {
        self.render_js = true;
        self
    }
}

/// Pagination detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Follow explicit "next" links
    pub follow_next_links: bool,

    /// Query parameter to increment when no explicit link exists.
    ///
    /// `None` disables numeric guessing.
    pub page_param: Option<String>,

    /// Highest page number to visit in one listing (seed page is 1)
    pub max_page_count: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            follow_next_links: true,
            page_param: None,
            max_page_count: 50,
        }
    }
}

/// Configuration for a crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum pages to visit per site
    pub max_pages: usize,

    /// Maximum link depth from the seed (0 = seed listing only)
    pub max_depth: usize,

    /// Retries after the first failed attempt of a page
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds (doubles per retry)
    pub retry_backoff_ms: u64,

    /// Upper bound on a single backoff in milliseconds
    pub max_backoff_ms: u64,

    /// Consecutive permanently failed pages before a site is abandoned
    pub failure_budget: usize,

    /// Deadline for one fetch attempt in milliseconds
    pub fetch_timeout_ms: u64,

    /// Concurrent fetches allowed per site
    pub per_site_concurrency: usize,

    /// Concurrent fetches allowed across all sites
    pub global_concurrency: usize,

    /// Requests per second per host (0 disables rate limiting)
    pub requests_per_second: u32,

    /// Only follow links on the seed's host
    pub same_site_only: bool,

    pub pagination: PaginationConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_depth: 2,
            max_retries: 2,
            retry_backoff_ms: 500,
            max_backoff_ms: 8_000,
            failure_budget: 5,
            fetch_timeout_ms: 30_000,
            per_site_concurrency: 2,
            global_concurrency: 8,
            requests_per_second: 2,
            same_site_only: true,
            pagination: PaginationConfig::default(),
        }
    }
}

impl CrawlConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum pages per site.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }

    /// Set maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set retry count and initial backoff.
    pub fn with_retries(mut self, retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Set the consecutive failure budget.
    pub fn with_failure_budget(mut self, budget: usize) -> Self {
        self.failure_budget = budget;
        self
    }

    /// Set the fetch deadline.
    pub fn with_fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.fetch_timeout_ms = ms;
        self
    }

    /// Set per-site and global concurrency.
    pub fn with_concurrency(mut self, per_site: usize, global: usize) -> Self {
        self.per_site_concurrency = per_site;
        self.global_concurrency = global;
        self
    }

    /// Set the numeric page parameter for pagination guessing.
    pub fn with_page_param(mut self, param: impl Into<String>) -> Self {
        self.pagination.page_param = Some(param.into());
        self
    }

    /// Set the maximum page number for paginated listings.
    pub fn with_max_page_count(mut self, max: u32) -> Self {
        self.pagination.max_page_count = max;
        self
    }

    /// Allow following links to other hosts.
    pub fn allow_off_site(mut self) -> Self {
        self.same_site_only = false;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Backoff before retry number `attempt` (1-based), capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let ms = self.retry_backoff_ms.saturating_mul(factor);
        Duration::from_millis(ms.min(self.max_backoff_ms))
    }
}
