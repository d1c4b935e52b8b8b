//! Persistence sink for crawl records.
//!
//! The crawl core emits a stream of [`CrawlRecord`]s; where they go (file,
//! queue, database) is the sink's concern.

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::types::report::CrawlRecord;

/// Caller-supplied writer for the audit trail.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist one record.
    async fn write(&self, record: &CrawlRecord) -> SinkResult<()>;

    /// Flush buffered records. Default is a no-op.
    async fn flush(&self) -> SinkResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: RecordSink + ?Sized> RecordSink for std::sync::Arc<S> {
    async fn write(&self, record: &CrawlRecord) -> SinkResult<()> {
        (**self).write(record).await
    }

    async fn flush(&self) -> SinkResult<()> {
        (**self).flush().await
    }
}
