//! The crawl pipeline: frontier, pre-filter gate, pagination detection and
//! the orchestrator that ties them to a fetcher and a sink.

pub mod frontier;
pub mod gate;
pub mod orchestrator;
pub mod pagination;

pub use frontier::{Frontier, FrontierStats};
pub use gate::{FilterConfig, HeuristicFilter};
pub use orchestrator::CrawlOrchestrator;
pub use pagination::{increment_page_param, looks_like_next, PaginationDetector};
