//! Multi-site crawl frontier for technology-transfer listings
//!
//! Crawls university tech-transfer sites, follows their paginated listings,
//! deduplicates discovered URLs and drops obvious non-listings before they
//! cost a fetch. Everything the crawl decides is written to a record sink.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tto_crawler::{
//!     CrawlConfig, CrawlOrchestrator, FetcherExt, HttpFetcher, MemorySink, SiteSeed,
//! };
//!
//! let fetcher = HttpFetcher::new()?.rate_limited(2);
//! let sink = Arc::new(MemorySink::new());
//! let orchestrator = CrawlOrchestrator::new(fetcher, sink.clone(), CrawlConfig::default());
//!
//! let report = orchestrator
//!     .run(&[SiteSeed::new("stanford", "https://techfinder.stanford.edu/")])
//!     .await;
//! println!("{} pages", report.pages_crawled());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams: Fetcher, LinkFilter, RecordSink, Classifier
//! - [`types`] - Frontier entries, pages, config, run reports
//! - [`pipeline`] - Frontier, filter gate, pagination detector, orchestrator
//! - [`fetchers`] - HTTP, headless browser, routing and rate limiting
//! - [`sinks`] - In-memory and JSON Lines record sinks
//! - [`classifiers`] - Keyword and model-backed classification strategy
//! - [`extract`] - Listing detail extraction
//! - [`scoring`] - Weighted due-diligence scoring
//! - [`testing`] - Mock fetcher and classifier

pub mod classifiers;
pub mod error;
pub mod extract;
pub mod fetchers;
pub mod pipeline;
pub mod scoring;
pub mod sinks;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ClassifyError, FetchError, FrontierError, SinkError, SiteCrawlError};
pub use traits::{
    classifier::{Classification, Classifier},
    fetcher::Fetcher,
    filter::{AllowAll, LinkCandidate, LinkFilter},
    sink::RecordSink,
};
pub use types::{
    config::{CrawlConfig, PaginationConfig, SiteSeed},
    entry::{
        EntryKind, FilterDecision, FilterReason, FrontierEntry, PaginationSignal,
        PaginationStrategy,
    },
    normalize::{normalize_url, site_host},
    page::{Link, PageResult},
    report::{CrawlRecord, CrawlReport, FailureRecord, PageRecord, SiteReport, SiteState},
};

// Re-export pipeline components
pub use pipeline::{
    CrawlOrchestrator, FilterConfig, Frontier, FrontierStats, HeuristicFilter,
    PaginationDetector,
};

// Re-export fetchers
#[cfg(feature = "browser")]
pub use fetchers::BrowserFetcher;
pub use fetchers::{FetcherExt, HttpFetcher, RateLimitedFetcher, RoutingFetcher};

// Re-export sinks
pub use sinks::{JsonLinesSink, MemorySink};

// Re-export classification, extraction and scoring
pub use classifiers::{
    ClassifierKind, ClassifierStrategy, KeywordClassifier, ModelClassifier, ModelConfig,
};
pub use extract::{extract_from_page, extract_listing, ListingDetails};
pub use scoring::{Band, CompositeScore, PillarScores, ScoreWeights};

// Re-export testing utilities
pub use testing::{MockClassifier, MockFetcher};
