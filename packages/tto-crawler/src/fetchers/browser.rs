//! Headless Chromium renderer for script-heavy listing sites.
//!
//! Enabled with the `browser` feature. One browser process is shared;
//! tabs are opened per fetch and bounded by a semaphore.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::fetchers::parse::parse_page;
use crate::traits::fetcher::Fetcher;
use crate::types::page::PageResult;

/// Closes its tab when dropped.
///
/// `Page` needs an async close to release the CDP target, so `Drop`
/// spawns it on the current runtime.
struct PageGuard {
    page: Option<Page>,
    url: String,
}

impl PageGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page: Some(page),
            url: url.to_string(),
        }
    }

    fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(url = %self.url, error = %e, "failed to close tab");
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let url = std::mem::take(&mut self.url);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        warn!(url = %url, error = %e, "tab cleanup on drop failed");
                    }
                });
            }
        }
    }
}

/// Renders pages in headless Chromium before parsing.
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    tabs: Arc<Semaphore>,
    settle: Duration,
    handler_task: JoinHandle<()>,
}

impl BrowserFetcher {
    /// Launch a headless browser with up to `max_tabs` concurrent pages.
    pub async fn launch(max_tabs: usize) -> FetchResult<Self> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|reason| FetchError::Render {
                url: String::new(),
                reason: format!("browser config: {}", reason),
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| FetchError::Render {
            url: String::new(),
            reason: format!("browser launch: {}", e),
        })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(max_tabs, "headless browser launched");
        Ok(Self {
            browser: Arc::new(browser),
            tabs: Arc::new(Semaphore::new(max_tabs.max(1))),
            settle: Duration::from_millis(500),
            handler_task,
        })
    }

    /// Extra wait after navigation for client-side rendering to finish.
    pub fn with_settle_time(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    async fn render(&self, url: &str) -> FetchResult<(String, String)> {
        let render_err = |reason: String| FetchError::Render {
            url: url.to_string(),
            reason,
        };

        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| render_err(format!("open tab: {}", e)))?;
        let guard = PageGuard::new(page, url);
        let page = guard
            .page()
            .ok_or_else(|| render_err("tab already closed".to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| render_err(format!("navigation: {}", e)))?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| render_err(format!("read content: {}", e)))?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        guard.close().await;
        Ok((html, final_url))
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, _render_js: bool) -> FetchResult<PageResult> {
        let requested = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        let _permit = self.tabs.acquire().await.map_err(|_| FetchError::Render {
            url: url.to_string(),
            reason: "browser shut down".to_string(),
        })?;

        debug!(url = %url, "rendering");
        let (html, final_url) = self.render(url).await?;
        let final_url = Url::parse(&final_url).unwrap_or(requested);

        // CDP does not report the document status here
        Ok(parse_page(url, &final_url, 200, html, true))
    }

    fn name(&self) -> &str {
        "browser"
    }
}
