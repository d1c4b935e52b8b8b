//! Crawl orchestrator: drives each seeded site through its lifecycle.
//!
//! ```text
//! Seeded -> Crawling -> Exhausted | Bounded | Failed | Cancelled
//! ```
//!
//! Sites run concurrently. Within a site up to `per_site_concurrency`
//! fetches are in flight, and a shared semaphore caps fetches across all
//! sites at `global_concurrency`.

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FetchError, FrontierError, SiteCrawlError};
use crate::pipeline::frontier::Frontier;
use crate::pipeline::gate::HeuristicFilter;
use crate::pipeline::pagination::PaginationDetector;
use crate::traits::fetcher::Fetcher;
use crate::traits::filter::{LinkCandidate, LinkFilter};
use crate::traits::sink::RecordSink;
use crate::types::config::{CrawlConfig, SiteSeed};
use crate::types::entry::{
    EntryKind, FilterDecision, FilterReason, FrontierEntry, PaginationSignal, PaginationStrategy,
};
use crate::types::normalize::{normalize_url, site_host};
use crate::types::page::PageResult;
use crate::types::report::{
    CrawlRecord, CrawlReport, FailureRecord, PageRecord, SiteReport, SiteState,
};

/// A page that did not produce a result.
#[derive(Debug)]
struct FailedFetch {
    error: FetchError,
    attempts: u32,
    /// Retries were cut short by cancellation
    cancelled: bool,
}

/// Reason code for pages abandoned mid-retry by cancellation.
const CANCELLED_REASON: &str = "cancelled";

/// Mutable bookkeeping for one site while it crawls.
struct SiteRun<'a> {
    seed: &'a SiteSeed,
    host: Option<String>,
    report: SiteReport,
    rejected: HashSet<String>,
    dispatched: usize,
    consecutive_failures: usize,
    depth_withheld: bool,
}

impl<'a> SiteRun<'a> {
    fn new(seed: &'a SiteSeed) -> Self {
        Self {
            seed,
            host: site_host(&seed.url),
            report: SiteReport::new(&seed.name),
            rejected: HashSet::new(),
            dispatched: 0,
            consecutive_failures: 0,
            depth_withheld: false,
        }
    }

    fn site(&self) -> &str {
        &self.seed.name
    }

    fn is_on_site(&self, url: &str) -> bool {
        match (&self.host, site_host(url)) {
            (Some(seed_host), Some(host)) => {
                host == *seed_host || host.ends_with(&format!(".{}", seed_host))
            }
            _ => false,
        }
    }
}

/// Runs a crawl over a set of seed sites.
///
/// # Example
///
/// ```rust,ignore
/// use tto_crawler::{CrawlConfig, CrawlOrchestrator, HttpFetcher, MemorySink, SiteSeed};
///
/// let sink = std::sync::Arc::new(MemorySink::new());
/// let orchestrator =
///     CrawlOrchestrator::new(HttpFetcher::new()?, sink.clone(), CrawlConfig::default());
/// let report = orchestrator
///     .run(&[SiteSeed::new("stanford", "https://techfinder.stanford.edu/")])
///     .await;
/// ```
pub struct CrawlOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    filter: Arc<dyn LinkFilter>,
    sink: Arc<dyn RecordSink>,
    frontier: Arc<Frontier>,
    detector: PaginationDetector,
    config: CrawlConfig,
    global: Arc<Semaphore>,
    run_id: Uuid,
}

impl CrawlOrchestrator {
    /// Create an orchestrator with the default heuristic filter and a fresh
    /// frontier.
    pub fn new(
        fetcher: impl Fetcher + 'static,
        sink: impl RecordSink + 'static,
        config: CrawlConfig,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            filter: Arc::new(HeuristicFilter::default()),
            sink: Arc::new(sink),
            frontier: Arc::new(Frontier::new()),
            detector: PaginationDetector::new(config.pagination.clone()),
            global: Arc::new(Semaphore::new(config.global_concurrency.max(1))),
            config,
            run_id: Uuid::now_v7(),
        }
    }

    /// Replace the pre-filter gate.
    pub fn with_filter(mut self, filter: impl LinkFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    /// Share a frontier, e.g. to inspect it after the run.
    pub fn with_frontier(mut self, frontier: Arc<Frontier>) -> Self {
        self.frontier = frontier;
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl every site to a terminal state.
    pub async fn run(&self, seeds: &[SiteSeed]) -> CrawlReport {
        self.run_with_cancel(seeds, CancellationToken::new()).await
    }

    /// Crawl until every site is terminal or `cancel` fires.
    ///
    /// After cancellation no new fetches start; fetches already in flight
    /// finish and are recorded.
    pub async fn run_with_cancel(
        &self,
        seeds: &[SiteSeed],
        cancel: CancellationToken,
    ) -> CrawlReport {
        let started_at = Utc::now();

        let mut names = HashSet::new();
        let unique: Vec<&SiteSeed> = seeds
            .iter()
            .filter(|seed| {
                let fresh = names.insert(seed.name.as_str());
                if !fresh {
                    warn!(site = %seed.name, "duplicate site name in seed list, skipping");
                }
                fresh
            })
            .collect();

        info!(run_id = %self.run_id, sites = unique.len(), "crawl starting");

        let sites = join_all(unique.into_iter().map(|seed| self.crawl_site(seed, &cancel))).await;

        if let Err(e) = self.sink.flush().await {
            warn!(error = %e, "failed to flush record sink");
        }

        let report = CrawlReport {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            sites,
        };
        info!(
            run_id = %self.run_id,
            pages = report.pages_crawled(),
            "crawl finished"
        );
        report
    }

    /// Crawl a single site to a terminal state.
    pub async fn crawl_site(&self, seed: &SiteSeed, cancel: &CancellationToken) -> SiteReport {
        let mut run = SiteRun::new(seed);

        match self.frontier.enqueue_seed(&seed.url, &seed.name) {
            Ok(Some(entry)) => {
                self.emit(CrawlRecord::Enqueued {
                    run_id: self.run_id,
                    entry,
                })
                .await;
            }
            Ok(None) => {
                warn!(site = %seed.name, url = %seed.url, "seed already known to the frontier");
            }
            Err(e) => {
                warn!(site = %seed.name, url = %seed.url, error = %e, "invalid seed");
                run.report.state = SiteState::Failed;
                run.report.error = Some(e.to_string());
                return self.finish(run).await;
            }
        }

        info!(
            site = %seed.name,
            url = %seed.url,
            render_js = seed.render_js,
            "site crawl starting"
        );
        run.report.state = SiteState::Crawling;

        let outcome = self.crawl_loop(&mut run, cancel).await;
        run.report.state = match outcome {
            Ok(state) => state,
            Err(e) => {
                warn!(site = %seed.name, error = %e, "site abandoned");
                run.report.error = Some(e.to_string());
                SiteState::Failed
            }
        };

        if run.report.state != SiteState::Exhausted {
            let dropped = self.frontier.drain_site(&seed.name);
            if dropped > 0 {
                debug!(site = %seed.name, dropped, "dropped queued entries");
            }
        }

        self.finish(run).await
    }

    async fn finish(&self, run: SiteRun<'_>) -> SiteReport {
        let report = run.report;
        info!(
            site = %report.site,
            state = ?report.state,
            pages = report.pages_crawled,
            failed = report.pages_failed,
            rejected = report.links_rejected,
            cycles = report.cycles_detected,
            "site crawl finished"
        );
        self.emit(CrawlRecord::SiteFinished {
            run_id: self.run_id,
            report: report.clone(),
        })
        .await;
        report
    }

    async fn crawl_loop(
        &self,
        run: &mut SiteRun<'_>,
        cancel: &CancellationToken,
    ) -> Result<SiteState, SiteCrawlError> {
        let per_site = self.config.per_site_concurrency.max(1);
        let mut in_flight = FuturesUnordered::new();
        let mut budget_exceeded: Option<SiteCrawlError> = None;

        loop {
            if !cancel.is_cancelled() && budget_exceeded.is_none() {
                while in_flight.len() < per_site && run.dispatched < self.config.max_pages {
                    let Some(entry) = self.frontier.dequeue_site(run.site()) else {
                        break;
                    };
                    run.dispatched += 1;
                    in_flight.push(self.fetch_with_retry(entry, run.seed.render_js, cancel));
                }
            }

            let Some((entry, outcome)) = in_flight.next().await else {
                break;
            };

            match outcome {
                Ok(page) => {
                    run.consecutive_failures = 0;
                    run.report.pages_crawled += 1;
                    self.emit(CrawlRecord::Page {
                        run_id: self.run_id,
                        page: PageRecord::from_page(&entry, &page),
                    })
                    .await;
                    if budget_exceeded.is_none() {
                        self.process_page(run, &entry, &page).await;
                    }
                }
                Err(failed) if failed.cancelled => {
                    debug!(
                        site = %run.site(),
                        url = %entry.url,
                        attempts = failed.attempts,
                        "retries abandoned on cancellation"
                    );
                    self.emit(CrawlRecord::Failed {
                        run_id: self.run_id,
                        failure: FailureRecord {
                            url: entry.url.clone(),
                            site: entry.source_site.clone(),
                            reason: CANCELLED_REASON.to_string(),
                            message: failed.error.to_string(),
                            attempts: failed.attempts,
                        },
                    })
                    .await;
                }
                Err(failed) => {
                    run.consecutive_failures += 1;
                    run.report.pages_failed += 1;
                    warn!(
                        site = %run.site(),
                        url = %entry.url,
                        attempts = failed.attempts,
                        error = %failed.error,
                        "page failed permanently"
                    );
                    self.emit(CrawlRecord::Failed {
                        run_id: self.run_id,
                        failure: FailureRecord {
                            url: entry.url.clone(),
                            site: entry.source_site.clone(),
                            reason: failed.error.code().to_string(),
                            message: failed.error.to_string(),
                            attempts: failed.attempts,
                        },
                    })
                    .await;

                    if budget_exceeded.is_none()
                        && run.consecutive_failures >= self.config.failure_budget.max(1)
                    {
                        // stop dispatching; fetches already in flight still get recorded
                        budget_exceeded = Some(SiteCrawlError::FailureBudgetExceeded {
                            pages_crawled: run.report.pages_crawled,
                            consecutive_failures: run.consecutive_failures,
                        });
                    }
                }
            }
        }

        if let Some(e) = budget_exceeded {
            return Err(e);
        }
        if cancel.is_cancelled() {
            return Ok(SiteState::Cancelled);
        }

        let queued = self.frontier.queued_for(run.site());
        if (run.dispatched >= self.config.max_pages && queued > 0) || run.depth_withheld {
            Ok(SiteState::Bounded)
        } else {
            Ok(SiteState::Exhausted)
        }
    }

    /// Fetch with a per-attempt timeout and capped exponential backoff
    /// between retryable failures.
    async fn fetch_with_retry(
        &self,
        entry: FrontierEntry,
        render_js: bool,
        cancel: &CancellationToken,
    ) -> (FrontierEntry, Result<PageResult, FailedFetch>) {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = {
                // the semaphore is never closed
                let _permit = self.global.acquire().await.ok();
                debug!(url = %entry.url, attempt, "fetching");
                match tokio::time::timeout(
                    self.config.fetch_timeout(),
                    self.fetcher.fetch(&entry.url, render_js),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout {
                        url: entry.url.clone(),
                    }),
                }
            };

            let error = match result {
                Ok(page) => return (entry, Ok(page)),
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= max_attempts {
                let failed = FailedFetch {
                    error,
                    attempts: attempt,
                    cancelled: false,
                };
                return (entry, Err(failed));
            }
            if cancel.is_cancelled() {
                let failed = FailedFetch {
                    error,
                    attempts: attempt,
                    cancelled: true,
                };
                return (entry, Err(failed));
            }

            let delay = self.config.backoff_for(attempt);
            debug!(
                url = %entry.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying after backoff"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    let failed = FailedFetch {
                        error,
                        attempts: attempt,
                        cancelled: true,
                    };
                    return (entry, Err(failed));
                }
            }
        }
    }

    /// Queue the page's successor and its passing links.
    async fn process_page(&self, run: &mut SiteRun<'_>, entry: &FrontierEntry, page: &PageResult) {
        let mut signal = self.detector.detect(page, entry.page_number());
        // Detail pages only paginate through explicit links.
        if entry.kind == EntryKind::Link
            && signal.strategy == Some(PaginationStrategy::NumericParam)
        {
            signal = PaginationSignal::none();
        }
        let next_key = signal
            .next_url
            .as_deref()
            .and_then(|u| normalize_url(u).ok());

        let mut new_links = 0usize;
        for link in &page.extracted_links {
            let Ok(key) = normalize_url(&link.url) else {
                self.reject(run, FilterDecision::reject(&link.url, FilterReason::InvalidUrl))
                    .await;
                continue;
            };
            if Some(&key) == next_key.as_ref() || self.frontier.is_known(&key) {
                continue;
            }

            if self.config.same_site_only && !run.is_on_site(&key) {
                self.reject(run, FilterDecision::reject(&key, FilterReason::OffSite))
                    .await;
                continue;
            }

            let decision = self.filter.evaluate(&LinkCandidate::new(
                &key,
                &link.anchor_text,
                &link.context,
            ));
            if !decision.passed {
                self.reject(run, decision).await;
                continue;
            }

            let depth = entry.depth + 1;
            if depth > self.config.max_depth {
                run.depth_withheld = true;
                self.reject(run, FilterDecision::reject(&key, FilterReason::DepthLimit))
                    .await;
                continue;
            }

            match self.frontier.enqueue_kind(&key, run.site(), depth, EntryKind::Link) {
                Ok(Some(queued)) => {
                    new_links += 1;
                    self.emit(CrawlRecord::Enqueued {
                        run_id: self.run_id,
                        entry: queued,
                    })
                    .await;
                }
                Ok(None) => {}
                Err(e) => debug!(url = %key, error = %e, "link not queued"),
            }
        }

        let Some(next) = signal.next_url else {
            debug!(site = %run.site(), url = %entry.url, new_links, "no next page");
            return;
        };

        // A numeric guess past the last real page usually renders an empty
        // listing; stop there.
        if signal.strategy == Some(PaginationStrategy::NumericParam) && new_links == 0 {
            debug!(
                site = %run.site(),
                url = %next,
                "numeric pagination yielded nothing new, stopping"
            );
            return;
        }
        if self.config.same_site_only && !run.is_on_site(&next) {
            debug!(site = %run.site(), url = %next, "next page is off-site, not followed");
            return;
        }

        let page_number = entry.page_number().saturating_add(1);
        match self
            .frontier
            .enqueue_next_page(&next, run.site(), entry.depth, page_number)
        {
            Ok(Some(queued)) => {
                debug!(site = %run.site(), url = %queued.url, page_number, "next page queued");
                self.emit(CrawlRecord::Enqueued {
                    run_id: self.run_id,
                    entry: queued,
                })
                .await;
            }
            Ok(None) => {}
            Err(FrontierError::CycleDetected { url }) => {
                warn!(
                    site = %run.site(),
                    from = %entry.url,
                    to = %url,
                    "pagination cycle detected"
                );
                run.report.cycles_detected += 1;
                self.emit(CrawlRecord::Cycle {
                    run_id: self.run_id,
                    site: run.site().to_string(),
                    from: entry.url.clone(),
                    to: url,
                })
                .await;
            }
            Err(e) => debug!(url = %next, error = %e, "next page not queued"),
        }
    }

    /// Record a rejection once per URL per site.
    async fn reject(&self, run: &mut SiteRun<'_>, decision: FilterDecision) {
        if !run.rejected.insert(decision.url.clone()) {
            return;
        }
        run.report.links_rejected += 1;
        debug!(
            site = %run.site(),
            url = %decision.url,
            reason = decision.reason.code(),
            "link rejected"
        );
        self.emit(CrawlRecord::Rejected {
            run_id: self.run_id,
            site: run.site().to_string(),
            decision,
        })
        .await;
    }

    async fn emit(&self, record: CrawlRecord) {
        if let Err(e) = self.sink.write(&record).await {
            warn!(error = %e, "failed to write crawl record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use crate::testing::MockFetcher;
    use crate::traits::filter::AllowAll;

    fn fast_config() -> CrawlConfig {
        CrawlConfig::default()
            .with_retries(1, 1)
            .with_fetch_timeout_ms(1_000)
    }

    #[tokio::test]
    async fn test_single_page_site_is_exhausted() {
        let fetcher = MockFetcher::new().with_page("https://a.edu/techs", "<p>No listings yet</p>");
        let sink = Arc::new(MemorySink::new());
        let orchestrator = CrawlOrchestrator::new(fetcher, sink.clone(), fast_config());

        let report = orchestrator
            .crawl_site(&SiteSeed::new("a", "https://a.edu/techs"), &CancellationToken::new())
            .await;

        assert_eq!(report.state, SiteState::Exhausted);
        assert_eq!(report.pages_crawled, 1);
        assert_eq!(sink.pages().len(), 1);
        assert_eq!(sink.site_reports().len(), 1);
    }

    #[tokio::test]
    async fn test_links_are_filtered_and_queued() {
        let fetcher = MockFetcher::new()
            .with_page(
                "https://a.edu/techs",
                r#"
                <a href="/techs/1">Biosensor</a>
                <a href="/user/login">Log in</a>
                <a href="https://twitter.com/a">Twitter</a>
                <a href="https://other.org/page">Partner</a>
                "#,
            )
            .with_page("https://a.edu/techs/1", "<p>Biosensor</p>");
        let sink = Arc::new(MemorySink::new());
        let orchestrator = CrawlOrchestrator::new(fetcher.clone(), sink.clone(), fast_config());

        let report = orchestrator
            .crawl_site(&SiteSeed::new("a", "https://a.edu/techs"), &CancellationToken::new())
            .await;

        assert_eq!(report.pages_crawled, 2);
        assert_eq!(report.links_rejected, 3);
        assert_eq!(fetcher.fetch_count("https://a.edu/user/login"), 0);

        let reasons: Vec<FilterReason> = sink.rejections().iter().map(|d| d.reason).collect();
        assert!(reasons.contains(&FilterReason::Navigation));
        assert!(reasons.contains(&FilterReason::OffSite));
    }

    #[tokio::test]
    async fn test_depth_limit_bounds_site() {
        let fetcher = MockFetcher::new()
            .with_page("https://a.edu/techs", r#"<a href="/techs/1">One</a>"#);
        let sink = Arc::new(MemorySink::new());
        let orchestrator =
            CrawlOrchestrator::new(fetcher, sink.clone(), fast_config().with_max_depth(0))
                .with_filter(AllowAll);

        let report = orchestrator
            .crawl_site(&SiteSeed::new("a", "https://a.edu/techs"), &CancellationToken::new())
            .await;

        assert_eq!(report.state, SiteState::Bounded);
        assert_eq!(report.pages_crawled, 1);
        assert_eq!(sink.rejections()[0].reason, FilterReason::DepthLimit);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_is_not_retried() {
        let fetcher = MockFetcher::new().with_status("https://a.edu/gone", 404);
        let sink = Arc::new(MemorySink::new());
        let orchestrator =
            CrawlOrchestrator::new(fetcher.clone(), sink.clone(), fast_config().with_retries(3, 1));

        let report = orchestrator
            .crawl_site(&SiteSeed::new("a", "https://a.edu/gone"), &CancellationToken::new())
            .await;

        assert_eq!(fetcher.fetch_count("https://a.edu/gone"), 1);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(sink.failures()[0].reason, "http_error");
    }

    #[tokio::test]
    async fn test_render_flag_is_passed_through() {
        let fetcher = MockFetcher::new().with_page("https://a.edu/techs", "<p>app</p>");
        let sink = Arc::new(MemorySink::new());
        let orchestrator = CrawlOrchestrator::new(fetcher, sink.clone(), fast_config());

        orchestrator
            .crawl_site(
                &SiteSeed::new("a", "https://a.edu/techs").rendered(),
                &CancellationToken::new(),
            )
            .await;

        assert!(sink.pages()[0].rendered);
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_site() {
        let sink = Arc::new(MemorySink::new());
        let orchestrator = CrawlOrchestrator::new(MockFetcher::new(), sink.clone(), fast_config());

        let report = orchestrator
            .crawl_site(&SiteSeed::new("a", "not a url"), &CancellationToken::new())
            .await;

        assert_eq!(report.state, SiteState::Failed);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_site_names_are_skipped() {
        let fetcher = MockFetcher::new().with_page("https://a.edu/techs", "");
        let sink = Arc::new(MemorySink::new());
        let orchestrator = CrawlOrchestrator::new(fetcher, sink, fast_config());

        let report = orchestrator
            .run(&[
                SiteSeed::new("a", "https://a.edu/techs"),
                SiteSeed::new("a", "https://a.edu/other"),
            ])
            .await;

        assert_eq!(report.sites.len(), 1);
    }
}
