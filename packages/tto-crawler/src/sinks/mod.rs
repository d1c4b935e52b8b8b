//! Record sinks: where the crawl audit trail goes.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
