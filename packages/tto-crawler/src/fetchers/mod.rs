//! Fetcher implementations.
//!
//! - [`HttpFetcher`]: static HTML over reqwest
//! - [`BrowserFetcher`]: headless Chromium (feature `browser`)
//! - [`RoutingFetcher`]: picks a backend per request from the `render_js` flag
//! - [`RateLimitedFetcher`]: per-host politeness wrapper

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;
pub mod parse;
pub mod rate_limited;
pub mod routing;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use http::{HttpFetcher, HttpFetcherBuilder};
pub use rate_limited::{FetcherExt, RateLimitedFetcher};
pub use routing::RoutingFetcher;
