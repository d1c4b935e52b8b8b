//! Static HTML fetcher over HTTP.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::fetchers::parse::parse_page;
use crate::traits::fetcher::Fetcher;
use crate::types::page::PageResult;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; TTOCrawler/0.1)";

/// Fetches server-rendered HTML with reqwest and parses it with scraper.
///
/// Cannot execute scripts; a `render_js` request fails with
/// [`FetchError::Render`]. Put it behind a
/// [`RoutingFetcher`](crate::fetchers::RoutingFetcher) with a renderer for
/// script-heavy sites.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a 30 second timeout and up to 5 redirects.
    pub fn new() -> FetchResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    /// Use an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Builder for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherBuilder {
    timeout: Duration,
    max_redirects: usize,
    user_agent: String,
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpFetcherBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Redirects followed before the request fails (0 disables following).
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> FetchResult<HttpFetcher> {
        let redirect = if self.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(self.max_redirects)
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .redirect(redirect)
            .build()
            .map_err(|e| FetchError::Request(Box::new(e)))?;

        Ok(HttpFetcher { client })
    }
}

fn map_reqwest_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = e.status() {
        FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Request(Box::new(e))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult> {
        if render_js {
            return Err(FetchError::Render {
                url: url.to_string(),
                reason: "static HTTP fetcher cannot execute scripts".to_string(),
            });
        }

        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!(url = %url, "HTTP fetch starting");
        let response = self.client.get(parsed).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            map_reqwest_error(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let page = parse_page(url, &final_url, status.as_u16(), html, false);
        debug!(
            url = %url,
            final_url = %page.final_url,
            links = page.extracted_links.len(),
            has_next = page.has_next_page,
            "HTTP fetch complete"
        );
        Ok(page)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_request_is_refused() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch("https://a.edu/techs", true).await.unwrap_err();
        assert!(matches!(err, FetchError::Render { .. }));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch("not a url", false).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_builder() {
        let fetcher = HttpFetcher::builder()
            .timeout(Duration::from_secs(5))
            .max_redirects(0)
            .user_agent("TestBot/1.0")
            .build();
        assert!(fetcher.is_ok());
    }
}
