//! Pre-filter gate trait.
//!
//! A cheap, local decision on whether a discovered link deserves a full
//! fetch. Implementations must be pure: the same candidate always yields
//! the same decision.

use crate::types::entry::FilterDecision;

/// A link under consideration, with the text around it.
#[derive(Debug, Clone, Copy)]
pub struct LinkCandidate<'a> {
    pub url: &'a str,
    pub anchor_text: &'a str,
    pub surrounding_context: &'a str,
}

impl<'a> LinkCandidate<'a> {
    pub fn new(url: &'a str, anchor_text: &'a str, surrounding_context: &'a str) -> Self {
        Self {
            url,
            anchor_text,
            surrounding_context,
        }
    }
}

/// Pluggable pre-fetch predicate.
pub trait LinkFilter: Send + Sync {
    /// Decide on a candidate, with a reason for the audit trail.
    fn evaluate(&self, candidate: &LinkCandidate<'_>) -> FilterDecision;

    /// Whether the candidate is worth a deep fetch.
    fn should_deep_fetch(&self, url: &str, anchor_text: &str, surrounding_context: &str) -> bool {
        self.evaluate(&LinkCandidate::new(url, anchor_text, surrounding_context))
            .passed
    }
}

impl<F: LinkFilter + ?Sized> LinkFilter for std::sync::Arc<F> {
    fn evaluate(&self, candidate: &LinkCandidate<'_>) -> FilterDecision {
        (**self).evaluate(candidate)
    }
}

/// Accepts every candidate. Useful for full-site crawls and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl LinkFilter for AllowAll {
    fn evaluate(&self, candidate: &LinkCandidate<'_>) -> FilterDecision {
        FilterDecision::pass(
            candidate.url,
            crate::types::entry::FilterReason::DefaultAllow,
        )
    }
}
