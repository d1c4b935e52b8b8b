//! One fetcher interface over a static and a rendering backend.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::Fetcher;
use crate::types::page::PageResult;

/// Sends `render_js` requests to a renderer and everything else to a static
/// fetcher.
///
/// Without a renderer, rendered requests fail with [`FetchError::Render`]
/// instead of silently degrading to static HTML.
pub struct RoutingFetcher {
    static_fetcher: Arc<dyn Fetcher>,
    renderer: Option<Arc<dyn Fetcher>>,
}

impl RoutingFetcher {
    pub fn new(static_fetcher: impl Fetcher + 'static) -> Self {
        Self {
            static_fetcher: Arc::new(static_fetcher),
            renderer: None,
        }
    }

    /// Attach a JavaScript-capable backend.
    pub fn with_renderer(mut self, renderer: impl Fetcher + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }
}

#[async_trait]
impl Fetcher for RoutingFetcher {
    async fn fetch(&self, url: &str, render_js: bool) -> FetchResult<PageResult> {
        if !render_js {
            return self.static_fetcher.fetch(url, false).await;
        }

        match &self.renderer {
            Some(renderer) => {
                debug!(url = %url, backend = renderer.name(), "routing to renderer");
                renderer.fetch(url, true).await
            }
            None => Err(FetchError::Render {
                url: url.to_string(),
                reason: "no renderer configured".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "routing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    #[tokio::test]
    async fn test_routes_by_render_flag() {
        let static_fetcher = MockFetcher::new().with_page("https://a.edu/x", "<p>static</p>");
        let renderer = MockFetcher::new().with_page("https://a.edu/x", "<p>rendered</p>");
        let router = RoutingFetcher::new(static_fetcher.clone()).with_renderer(renderer.clone());

        let plain = router.fetch("https://a.edu/x", false).await.unwrap();
        let rendered = router.fetch("https://a.edu/x", true).await.unwrap();

        assert!(plain.raw_content.contains("static"));
        assert!(rendered.raw_content.contains("rendered"));
        assert!(rendered.rendered);
        assert_eq!(static_fetcher.fetch_count("https://a.edu/x"), 1);
        assert_eq!(renderer.fetch_count("https://a.edu/x"), 1);
    }

    #[tokio::test]
    async fn test_render_without_renderer_fails() {
        let router = RoutingFetcher::new(MockFetcher::new());
        assert!(!router.has_renderer());

        let err = router.fetch("https://a.edu/x", true).await.unwrap_err();
        assert!(matches!(err, FetchError::Render { .. }));
    }
}
