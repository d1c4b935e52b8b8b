//! In-memory record sink for tests and development.

use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard};

use crate::error::SinkResult;
use crate::traits::sink::RecordSink;
use crate::types::entry::{FilterDecision, FrontierEntry};
use crate::types::report::{CrawlRecord, FailureRecord, PageRecord, SiteReport};

/// Keeps every record in order. Data is lost when the sink is dropped.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<CrawlRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<CrawlRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    /// All records written so far.
    pub fn records(&self) -> Vec<CrawlRecord> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Fetched pages, in the order they completed.
    pub fn pages(&self) -> Vec<PageRecord> {
        self.read()
            .iter()
            .filter_map(|r| match r {
                CrawlRecord::Page { page, .. } => Some(page.clone()),
                _ => None,
            })
            .collect()
    }

    /// URLs of fetched pages, in the order they completed.
    pub fn page_urls(&self) -> Vec<String> {
        self.pages().into_iter().map(|p| p.url).collect()
    }

    pub fn enqueued(&self) -> Vec<FrontierEntry> {
        self.read()
            .iter()
            .filter_map(|r| match r {
                CrawlRecord::Enqueued { entry, .. } => Some(entry.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> Vec<FilterDecision> {
        self.read()
            .iter()
            .filter_map(|r| match r {
                CrawlRecord::Rejected { decision, .. } => Some(decision.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.read()
            .iter()
            .filter_map(|r| match r {
                CrawlRecord::Failed { failure, .. } => Some(failure.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(from, to)` pairs of detected pagination cycles.
    pub fn cycles(&self) -> Vec<(String, String)> {
        self.read()
            .iter()
            .filter_map(|r| match r {
                CrawlRecord::Cycle { from, to, .. } => Some((from.clone(), to.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn site_reports(&self) -> Vec<SiteReport> {
        self.read()
            .iter()
            .filter_map(|r| match r {
                CrawlRecord::SiteFinished { report, .. } => Some(report.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&self, record: &CrawlRecord) -> SinkResult<()> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entry::FilterReason;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_records_by_kind() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.write(&CrawlRecord::Rejected {
            run_id: Uuid::nil(),
            site: "a".into(),
            decision: FilterDecision::reject("https://a.edu/login", FilterReason::Navigation),
        })
        .await
        .unwrap();
        sink.write(&CrawlRecord::Cycle {
            run_id: Uuid::nil(),
            site: "a".into(),
            from: "https://a.edu/p2".into(),
            to: "https://a.edu/p1".into(),
        })
        .await
        .unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.rejections().len(), 1);
        assert_eq!(
            sink.cycles(),
            vec![("https://a.edu/p2".to_string(), "https://a.edu/p1".to_string())]
        );
        assert!(sink.pages().is_empty());

        sink.clear();
        assert!(sink.is_empty());
    }
}
