//! Data types shared across the crawl pipeline.

pub mod config;
pub mod entry;
pub mod page;
pub mod report;
pub mod normalize;
