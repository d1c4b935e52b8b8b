//! Pagination detection.
//!
//! Two strategies, tried in order:
//! 1. Explicit next link (markup found by the fetcher, or a "next"-style
//!    anchor among the page's links)
//! 2. Numeric page-parameter increment on a configured query parameter
//!
//! The cycle guard (next URL already known) lives in the frontier; this
//! module only reports what the page advertises.

use url::Url;

use crate::types::config::PaginationConfig;
use crate::types::entry::{PaginationSignal, PaginationStrategy};
use crate::types::page::PageResult;

/// Anchor texts that mean "next page" on listing sites.
const NEXT_TEXTS: &[&str] = &[
    "next",
    "next page",
    "next results",
    "more results",
    "older",
    "older entries",
    "›",
    "»",
    "→",
    ">",
    ">>",
];

/// Whether anchor text (or an aria label) reads as a next-page control.
pub fn looks_like_next(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }
    if NEXT_TEXTS.contains(&text.as_str()) {
        return true;
    }
    // "Next ›", "Next page »", "next 10"
    text.starts_with("next ") || text.starts_with("next›") || text.starts_with("next»")
}

/// Decides whether a listing page has a successor and where it is.
#[derive(Debug, Clone)]
pub struct PaginationDetector {
    config: PaginationConfig,
}

impl Default for PaginationDetector {
    fn default() -> Self {
        Self::new(PaginationConfig::default())
    }
}

impl PaginationDetector {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Detect the next page of `page`, which is page `page_number` (1-based)
    /// of its listing.
    pub fn detect(&self, page: &PageResult, page_number: u32) -> PaginationSignal {
        if page_number >= self.config.max_page_count {
            return PaginationSignal::none();
        }

        if self.config.follow_next_links {
            if let Some(next) = self.explicit_next(page) {
                return PaginationSignal::next(next, PaginationStrategy::ExplicitLink);
            }
        }

        if let Some(param) = &self.config.page_param {
            if let Some(next) = increment_page_param(&page.final_url, param) {
                return PaginationSignal::next(next, PaginationStrategy::NumericParam);
            }
        }

        PaginationSignal::none()
    }

    fn explicit_next(&self, page: &PageResult) -> Option<String> {
        let current = page.final_url.as_str();

        page.next_page_url
            .clone()
            .or_else(|| {
                page.extracted_links
                    .iter()
                    .find(|l| l.is_rel_next())
                    .or_else(|| {
                        page.extracted_links
                            .iter()
                            .find(|l| looks_like_next(&l.anchor_text))
                    })
                    .map(|l| l.url.clone())
            })
            .filter(|next| next != current && next != &page.url)
    }
}

/// URL with `param` incremented by one (absent counts as page 1).
///
/// Returns `None` if the current value is not a number or is already the
/// largest page number representable.
pub fn increment_page_param(url: &str, param: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;

    let mut found = false;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (k, v) in parsed.query_pairs() {
        if k == param {
            let current: u32 = v.trim().parse().ok()?;
            pairs.push((k.into_owned(), current.checked_add(1)?.to_string()));
            found = true;
        } else {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    if !found {
        pairs.push((param.to_string(), "2".to_string()));
    }

    parsed.query_pairs_mut().clear().extend_pairs(pairs.iter());
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::page::Link;

    fn detector(param: Option<&str>, max: u32) -> PaginationDetector {
        PaginationDetector::new(PaginationConfig {
            follow_next_links: true,
            page_param: param.map(String::from),
            max_page_count: max,
        })
    }

    #[test]
    fn test_looks_like_next() {
        assert!(looks_like_next("Next"));
        assert!(looks_like_next("  next page "));
        assert!(looks_like_next("Next ›"));
        assert!(looks_like_next("»"));
        assert!(!looks_like_next("Nextgen sequencing platform"));
        assert!(!looks_like_next("Previous"));
        assert!(!looks_like_next(""));
    }

    #[test]
    fn test_explicit_link_from_fetcher_markup() {
        let page = PageResult::new("https://a.edu/techs", "")
            .with_next_page("https://a.edu/techs?page=2");
        let signal = detector(None, 10).detect(&page, 1);

        assert!(signal.has_next);
        assert_eq!(signal.next_url.as_deref(), Some("https://a.edu/techs?page=2"));
        assert_eq!(signal.strategy, Some(PaginationStrategy::ExplicitLink));
    }

    #[test]
    fn test_explicit_link_from_anchor_text() {
        let page = PageResult::new("https://a.edu/techs", "")
            .with_link(Link::new("https://a.edu/techs/1", "Vaccine adjuvant"))
            .with_link(Link::new("https://a.edu/techs/p2", "Next »"));
        let signal = detector(None, 10).detect(&page, 1);

        assert_eq!(signal.next_url.as_deref(), Some("https://a.edu/techs/p2"));
    }

    #[test]
    fn test_explicit_beats_numeric() {
        let page = PageResult::new("https://a.edu/techs?page=1", "")
            .with_next_page("https://a.edu/techs/next-batch");
        let signal = detector(Some("page"), 10).detect(&page, 1);

        assert_eq!(signal.strategy, Some(PaginationStrategy::ExplicitLink));
        assert_eq!(signal.next_url.as_deref(), Some("https://a.edu/techs/next-batch"));
    }

    #[test]
    fn test_numeric_increment() {
        let page = PageResult::new("https://a.edu/techs?page=3&sort=az", "");
        let signal = detector(Some("page"), 10).detect(&page, 3);

        assert_eq!(signal.strategy, Some(PaginationStrategy::NumericParam));
        assert_eq!(
            signal.next_url.as_deref(),
            Some("https://a.edu/techs?page=4&sort=az")
        );
    }

    #[test]
    fn test_numeric_starts_at_two_when_absent() {
        assert_eq!(
            increment_page_param("https://a.edu/techs", "page").as_deref(),
            Some("https://a.edu/techs?page=2")
        );
    }

    #[test]
    fn test_non_numeric_param_gives_nothing() {
        assert!(increment_page_param("https://a.edu/techs?page=abc", "page").is_none());
    }

    #[test]
    fn test_last_representable_page_gives_nothing() {
        assert!(increment_page_param("https://a.edu/t?page=4294967295", "page").is_none());
        assert_eq!(
            increment_page_param("https://a.edu/t?page=4294967294", "page").as_deref(),
            Some("https://a.edu/t?page=4294967295")
        );

        let page = PageResult::new("https://a.edu/t?page=4294967295", "");
        assert!(!detector(Some("page"), u32::MAX).detect(&page, 3).has_next);
    }

    #[test]
    fn test_max_page_bound() {
        let page = PageResult::new("https://a.edu/techs?page=5", "")
            .with_next_page("https://a.edu/techs?page=6");
        assert!(!detector(Some("page"), 5).detect(&page, 5).has_next);
        assert!(detector(Some("page"), 6).detect(&page, 5).has_next);
    }

    #[test]
    fn test_self_link_is_not_next() {
        let page = PageResult::new("https://a.edu/techs", "")
            .with_next_page("https://a.edu/techs");
        assert!(!detector(None, 10).detect(&page, 1).has_next);
    }

    #[test]
    fn test_no_signal_without_strategies() {
        let page = PageResult::new("https://a.edu/techs", "");
        let detector = PaginationDetector::new(PaginationConfig {
            follow_next_links: false,
            page_param: None,
            max_page_count: 10,
        });
        assert_eq!(detector.detect(&page, 1), PaginationSignal::none());
    }
}
