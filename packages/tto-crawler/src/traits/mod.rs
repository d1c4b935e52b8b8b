//! Core trait abstractions for the crawl pipeline.
//!
//! These define the seams applications plug into: how pages are fetched,
//! which links are worth fetching, where records go, and how listings are
//! classified.

pub mod classifier;
pub mod fetcher;
pub mod filter;
pub mod sink;
