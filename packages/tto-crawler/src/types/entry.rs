//! Frontier entries and the decisions made about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an entry came to be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    /// Seed URL from the site list
    Seed,
    /// Link extracted from a fetched page
    Link,
    /// Pagination hop; `page_number` is 1-based (seed page is 1)
    NextPage { page_number: u32 },
}

/// A URL waiting in (or consumed from) the frontier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// Normalized URL, unique across the frontier
    pub url: String,

    /// Site this entry belongs to
    pub source_site: String,

    /// Link distance from the seed (pagination hops do not add depth)
    pub depth: usize,

    /// When the URL was first discovered
    pub discovered_at: DateTime<Utc>,

    pub kind: EntryKind,
}

impl FrontierEntry {
    /// Create an entry discovered now.
    pub fn new(
        url: impl Into<String>,
        source_site: impl Into<String>,
        depth: usize,
        kind: EntryKind,
    ) -> Self {
        Self {
            url: url.into(),
            source_site: source_site.into(),
            depth,
            discovered_at: Utc::now(),
            kind,
        }
    }

    /// Page number in a paginated listing (1 for anything not reached by a hop).
    pub fn page_number(&self) -> u32 {
        match self.kind {
            EntryKind::NextPage { page_number } => page_number,
            _ => 1,
        }
    }
}

/// Why a candidate link was accepted or rejected by the pre-filter gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    /// Matched an allow keyword
    KeywordMatch,
    /// No rule rejected it and no allow list is configured
    DefaultAllow,
    /// Not http(s)
    UnsupportedScheme,
    /// Points at another host
    OffSite,
    /// Binary or media file
    FileExtension,
    /// Site navigation, login, account or social links
    Navigation,
    /// Matched a configured deny pattern
    DenyPattern,
    /// An allow list is configured and nothing matched
    NoKeywordMatch,
    /// Exceeds the depth ceiling
    DepthLimit,
    /// URL could not be parsed
    InvalidUrl,
}

impl FilterReason {
    /// Stable code for audit output.
    pub fn code(&self) -> &'static str {
        match self {
            FilterReason::KeywordMatch => "keyword_match",
            FilterReason::DefaultAllow => "default_allow",
            FilterReason::UnsupportedScheme => "unsupported_scheme",
            FilterReason::OffSite => "off_site",
            FilterReason::FileExtension => "file_extension",
            FilterReason::Navigation => "navigation",
            FilterReason::DenyPattern => "deny_pattern",
            FilterReason::NoKeywordMatch => "no_keyword_match",
            FilterReason::DepthLimit => "depth_limit",
            FilterReason::InvalidUrl => "invalid_url",
        }
    }
}

/// Outcome of the pre-filter gate for one candidate. Immutable once made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDecision {
    pub url: String,
    pub passed: bool,
    pub reason: FilterReason,
}

impl FilterDecision {
    /// Accept a candidate.
    pub fn pass(url: impl Into<String>, reason: FilterReason) -> Self {
        Self {
            url: url.into(),
            passed: true,
            reason,
        }
    }

    /// Reject a candidate.
    pub fn reject(url: impl Into<String>, reason: FilterReason) -> Self {
        Self {
            url: url.into(),
            passed: false,
            reason,
        }
    }
}

/// Which pagination strategy produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    ExplicitLink,
    NumericParam,
}

/// Output of the pagination detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSignal {
    pub has_next: bool,
    pub next_url: Option<String>,
    pub strategy: Option<PaginationStrategy>,
}

impl PaginationSignal {
    /// No further page.
    pub fn none() -> Self {
        Self {
            has_next: false,
            next_url: None,
            strategy: None,
        }
    }

    /// A next page at `url`.
    pub fn next(url: impl Into<String>, strategy: PaginationStrategy) -> Self {
        Self {
            has_next: true,
            next_url: Some(url.into()),
            strategy: Some(strategy),
        }
    }
}
