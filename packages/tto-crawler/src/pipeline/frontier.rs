//! The crawl frontier: deduplicated, per-site FIFO queues.
//!
//! All state sits behind one mutex so that concurrent discovery of the same
//! link from several pages still admits it once. The lock is never held
//! across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::error::{FrontierError, FrontierResult};
use crate::types::entry::{EntryKind, FrontierEntry};
use crate::types::normalize::normalize_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlState {
    Queued,
    Visited,
}

/// Counts for progress reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    pub queued: usize,
    pub visited: usize,
    pub known: usize,
}

#[derive(Debug, Default)]
struct FrontierState {
    known: HashMap<String, UrlState>,
    queues: HashMap<String, VecDeque<FrontierEntry>>,
    /// Sites in first-seen order, for round-robin `dequeue`
    site_order: Vec<String>,
    cursor: usize,
    visited: usize,
}

impl FrontierState {
    fn admit(&mut self, entry: FrontierEntry) {
        self.known.insert(entry.url.clone(), UrlState::Queued);
        if !self.queues.contains_key(&entry.source_site) {
            self.site_order.push(entry.source_site.clone());
        }
        self.queues
            .entry(entry.source_site.clone())
            .or_default()
            .push_back(entry);
    }

    fn consume(&mut self, url: &str) {
        if let Some(slot) = self.known.get_mut(url) {
            if *slot != UrlState::Visited {
                *slot = UrlState::Visited;
                self.visited += 1;
            }
        }
    }

    fn queued(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

/// Shared frontier. Wrap in `Arc` and hand a clone to each worker.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // Poisoning is ignored: every critical section leaves the maps consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a discovered link. Returns `Ok(false)` if the normalized URL is
    /// already queued or visited.
    pub fn enqueue(&self, url: &str, source_site: &str, depth: usize) -> FrontierResult<bool> {
        self.enqueue_kind(url, source_site, depth, EntryKind::Link)
            .map(|e| e.is_some())
    }

    /// Queue a seed URL at depth 0.
    pub fn enqueue_seed(
        &self,
        url: &str,
        source_site: &str,
    ) -> FrontierResult<Option<FrontierEntry>> {
        self.enqueue_kind(url, source_site, 0, EntryKind::Seed)
    }

    /// Queue a pagination hop.
    ///
    /// A hop back to a URL that was already consumed means the listing loops
    /// on itself and is reported as [`FrontierError::CycleDetected`]. A hop
    /// to a URL that is still queued returns `Ok(None)`.
    pub fn enqueue_next_page(
        &self,
        url: &str,
        source_site: &str,
        depth: usize,
        page_number: u32,
    ) -> FrontierResult<Option<FrontierEntry>> {
        let normalized = normalize_url(url)?;
        let mut state = self.lock();
        match state.known.get(&normalized) {
            Some(UrlState::Visited) => Err(FrontierError::CycleDetected { url: normalized }),
            Some(UrlState::Queued) => Ok(None),
            None => {
                let entry = FrontierEntry::new(
                    normalized,
                    source_site,
                    depth,
                    EntryKind::NextPage { page_number },
                );
                state.admit(entry.clone());
                Ok(Some(entry))
            }
        }
    }

    /// Queue with an explicit kind; returns the new entry, or `None` if the
    /// URL was already known.
    pub fn enqueue_kind(
        &self,
        url: &str,
        source_site: &str,
        depth: usize,
        kind: EntryKind,
    ) -> FrontierResult<Option<FrontierEntry>> {
        let normalized = normalize_url(url)?;
        let mut state = self.lock();
        if state.known.contains_key(&normalized) {
            return Ok(None);
        }
        let entry = FrontierEntry::new(normalized, source_site, depth, kind);
        state.admit(entry.clone());
        Ok(Some(entry))
    }

    /// Next entry from any site; sites are served round-robin.
    ///
    /// A dequeued entry is consumed: it is marked visited and never handed
    /// out again.
    pub fn dequeue(&self) -> Option<FrontierEntry> {
        let mut state = self.lock();
        let sites = state.site_order.len();
        for offset in 0..sites {
            let idx = (state.cursor + offset) % sites;
            let site = state.site_order[idx].clone();
            if let Some(entry) = state.queues.get_mut(&site).and_then(VecDeque::pop_front) {
                state.cursor = (idx + 1) % sites;
                state.consume(&entry.url);
                return Some(entry);
            }
        }
        None
    }

    /// Next entry for one site (FIFO), consumed as in [`Frontier::dequeue`].
    pub fn dequeue_site(&self, site: &str) -> Option<FrontierEntry> {
        let mut state = self.lock();
        let entry = state.queues.get_mut(site).and_then(VecDeque::pop_front)?;
        state.consume(&entry.url);
        Some(entry)
    }

    /// Whether the URL has been queued or visited.
    pub fn is_known(&self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.lock().known.contains_key(&normalized),
            Err(_) => false,
        }
    }

    /// Whether the URL has been visited.
    pub fn is_visited(&self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.lock().known.get(&normalized) == Some(&UrlState::Visited),
            Err(_) => false,
        }
    }

    /// Entries still waiting for a site.
    pub fn queued_for(&self, site: &str) -> usize {
        self.lock().queues.get(site).map(VecDeque::len).unwrap_or(0)
    }

    /// Drop everything still queued for a site, returning how many were dropped.
    ///
    /// Dropped URLs stay known so they are not rediscovered.
    pub fn drain_site(&self, site: &str) -> usize {
        self.lock()
            .queues
            .get_mut(site)
            .map(|q| q.drain(..).count())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> FrontierStats {
        let state = self.lock();
        FrontierStats {
            queued: state.queued(),
            visited: state.visited,
            known: state.known.len(),
        }
    }
}
