//! Crawl outcomes and the audit records emitted to sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{FilterDecision, FrontierEntry};
use super::page::PageResult;

/// Lifecycle state of one site's crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteState {
    Seeded,
    Crawling,
    /// Frontier ran dry
    Exhausted,
    /// Page or depth ceiling stopped the crawl; a normal outcome
    Bounded,
    /// Failure budget exceeded
    Failed,
    /// Cancelled between fetch cycles
    Cancelled,
}

impl SiteState {
    /// Whether the crawl for this site has stopped.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SiteState::Seeded | SiteState::Crawling)
    }
}

/// Summary of one site's crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteReport {
    pub site: String,
    pub state: SiteState,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub links_rejected: usize,
    pub cycles_detected: usize,
    /// Set when `state` is `Failed`
    pub error: Option<String>,
}

impl SiteReport {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            state: SiteState::Seeded,
            pages_crawled: 0,
            pages_failed: 0,
            links_rejected: 0,
            cycles_detected: 0,
            error: None,
        }
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sites: Vec<SiteReport>,
}

impl CrawlReport {
    /// Total pages crawled across sites.
    pub fn pages_crawled(&self) -> usize {
        self.sites.iter().map(|s| s.pages_crawled).sum()
    }

    /// Report for a named site.
    pub fn site(&self, name: &str) -> Option<&SiteReport> {
        self.sites.iter().find(|s| s.site == name)
    }
}

/// A visited page as persisted (content hash instead of the body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub final_url: String,
    pub site: String,
    pub depth: usize,
    pub status: u16,
    pub title: Option<String>,
    pub content_hash: String,
    pub content_length: usize,
    pub link_count: usize,
    pub has_next_page: bool,
    pub next_page_url: Option<String>,
    pub rendered: bool,
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn from_page(entry: &FrontierEntry, page: &PageResult) -> Self {
        Self {
            url: entry.url.clone(),
            final_url: page.final_url.clone(),
            site: entry.source_site.clone(),
            depth: entry.depth,
            status: page.status,
            title: page.title.clone(),
            content_hash: page.content_hash(),
            content_length: page.raw_content.len(),
            link_count: page.extracted_links.len(),
            has_next_page: page.has_next_page,
            next_page_url: page.next_page_url.clone(),
            rendered: page.rendered,
            fetched_at: page.fetched_at,
        }
    }
}

/// A URL that failed permanently, with its reason code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub site: String,
    pub reason: String,
    pub message: String,
    pub attempts: u32,
}

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum CrawlRecord {
    /// URL admitted to the frontier
    Enqueued { run_id: uuid::Uuid, entry: FrontierEntry },
    /// Page fetched and processed
    Page { run_id: uuid::Uuid, page: PageRecord },
    /// Candidate rejected by the pre-filter gate
    Rejected {
        run_id: uuid::Uuid,
        site: String,
        decision: FilterDecision,
    },
    /// Pagination pointed back at a known URL
    Cycle {
        run_id: uuid::Uuid,
        site: String,
        from: String,
        to: String,
    },
    /// Page failed after all retries
    Failed { run_id: uuid::Uuid, failure: FailureRecord },
    /// Site reached a terminal state
    SiteFinished { run_id: uuid::Uuid, report: SiteReport },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entry::FilterReason;

    #[test]
    fn test_terminal_states() {
        assert!(!SiteState::Seeded.is_terminal());
        assert!(!SiteState::Crawling.is_terminal());
        assert!(SiteState::Bounded.is_terminal());
        assert!(SiteState::Failed.is_terminal());
    }

    #[test]
    fn test_record_is_tagged() {
        let record = CrawlRecord::Rejected {
            run_id: uuid::Uuid::nil(),
            site: "mit".into(),
            decision: FilterDecision::reject("https://a.edu/login", FilterReason::Navigation),
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["record"], "rejected");
        assert_eq!(json["decision"]["reason"], "navigation");
    }
}
