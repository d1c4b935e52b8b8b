//! Testing utilities: mock fetchers and classifiers.
//!
//! Useful for exercising the orchestrator and anything built on it without
//! network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::error::{ClassifyResult, FetchError, FetchResult};
use crate::fetchers::parse::parse_page;
use crate::traits::classifier::{Classification, Classifier};
use crate::traits::fetcher::Fetcher;
use crate::types::normalize::normalize_url;
use crate::types::page::PageResult;

/// Canned behavior for one URL.
#[derive(Debug, Clone)]
enum MockResponse {
    Html(String),
    Status(u16),
    Timeout,
}

/// A fetcher that serves canned HTML.
///
/// URLs are matched after normalization. Unknown URLs answer 404. Clones
/// share responses and call tracking.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    calls: Arc<RwLock<Vec<MockFetchCall>>>,
}

/// Record of a call made to the mock fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFetchCall {
    pub url: String,
    pub render_js: bool,
}

fn key(url: &str) -> String {
    normalize_url(url).unwrap_or_else(|_| url.to_string())
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn respond(self, url: &str, response: MockResponse) -> Self {
        self.responses.write().unwrap().insert(key(url), response);
        self
    }

    /// Serve `html` for `url`.
    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.respond(url, MockResponse::Html(html.into()))
    }

    /// Answer `url` with an HTTP error status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.respond(url, MockResponse::Status(status))
    }

    /// Fail every fetch of `url` with a retryable server error.
    pub fn failing(self, url: &str) -> Self {
        self.with_status(url, 503)
    }

    /// Fail every fetch of `url` with a timeout.
    pub fn with_timeout(self, url: &str) -> Self {
        self.respond(url, MockResponse::Timeout)
    }

    /// Sleep before answering `url`.
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(key(url), delay);
        self
    }

    /// A listing of `pages` pages at `{base}?page=N`, each chained to the
    /// next by a "Next" anchor and carrying `items_per_page` item links at
    /// `{base}/item-N-M`.
    pub fn with_paginated_listing(mut self, base: &str, pages: u32, items_per_page: u32) -> Self {
        for n in 1..=pages {
            let mut html = format!(
                "<html><head><title>Listing page {}</title></head><body><ul>",
                n
            );
            for m in 1..=items_per_page {
                html.push_str(&format!(
                    r#"<li><a href="{base}/item-{n}-{m}">Technology {n}.{m}</a></li>"#
                ));
            }
            html.push_str("</ul>");
            if n < pages {
                html.push_str(&format!(r#"<a href="{base}?page={}">Next</a>"#, n + 1));
            }
            html.push_str("</body></html>");

            self = self.with_page(&format!("{}?page={}", base, n), html);
            for m in 1..=items_per_page {
                self = self.with_page(
                    &format!("{}/item-{}-{}", base, n, m),
                    format!("<h1>Technology {}.{}</h1>", n, m),
                );
            }
        }
        self
    }

    /// All calls in the order they were made.
    pub fn calls(&self) -> Vec<MockFetchCall> {
        self.calls.read().unwrap().clone()
    }

    /// URLs fetched, in order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    /// Number of fetches of `url` (after normalization).
    pub fn fetch_count(&self, url: &str) -> usize {
        let k = key(url);
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| key(&c.url) == k)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult> {
        self.calls.write().unwrap().push(MockFetchCall {
            url: url.to_string(),
            render_js,
        });

        let k = key(url);
        let delay = self.delays.read().unwrap().get(&k).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.read().unwrap().get(&k).cloned();
        match response {
            Some(MockResponse::Html(html)) => {
                let final_url = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
                    url: url.to_string(),
                })?;
                Ok(parse_page(url, &final_url, 200, html, render_js))
            }
            Some(MockResponse::Status(status)) => Err(FetchError::Http {
                url: url.to_string(),
                status,
            }),
            Some(MockResponse::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A classifier with a fixed answer per input substring.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    rules: Vec<(String, Classification)>,
    fallback: Classification,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Classification::new("UNKNOWN", 0.0),
            calls: Arc::default(),
        }
    }
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `label` when the input contains `needle`.
    pub fn with_rule(mut self, needle: impl Into<String>, label: &str, confidence: f32) -> Self {
        self.rules
            .push((needle.into(), Classification::new(label, confidence)));
        self
    }

    pub fn with_fallback(mut self, label: &str, confidence: f32) -> Self {
        self.fallback = Classification::new(label, confidence);
        self
    }

    /// Inputs seen, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, text: &str) -> ClassifyResult<Classification> {
        self.calls.write().unwrap().push(text.to_string());
        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, c)| c.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
