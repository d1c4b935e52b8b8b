//! Heuristic pre-filter gate.
//!
//! Rejects links that are obviously not listings (navigation, login,
//! unrelated departments, binary files) before a fetch is spent on them.
//! Everything is local string matching; no network, no randomness.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::traits::filter::{LinkCandidate, LinkFilter};
use crate::types::entry::{FilterDecision, FilterReason};

/// Rules for [`HeuristicFilter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// File extensions never worth fetching
    pub deny_extensions: Vec<String>,

    /// Site chrome: login, account, legal, sharing
    pub navigation_terms: Vec<String>,

    /// Hosts that are always off-topic (social networks)
    pub navigation_hosts: Vec<String>,

    /// Unrelated sections of a university site
    pub deny_terms: Vec<String>,

    /// If non-empty, a link must mention one of these to pass
    pub allow_keywords: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            deny_extensions: strings(&[
                "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "zip", "doc", "docx", "xls",
                "xlsx", "ppt", "pptx", "mp3", "mp4", "mov", "ics", "css", "js", "xml",
            ]),
            navigation_terms: strings(&[
                "login", "log in", "logout", "log out", "sign in", "signin", "sign up",
                "register", "my account", "account", "cart", "privacy", "privacy policy",
                "terms of use", "accessibility", "cookie", "cookies", "sitemap", "skip to",
                "share", "print",
            ]),
            navigation_hosts: strings(&[
                "facebook.com", "twitter.com", "x.com", "linkedin.com", "instagram.com",
                "youtube.com", "tiktok.com", "flickr.com",
            ]),
            deny_terms: strings(&[
                "athletics", "admissions", "alumni", "giving", "donate", "calendar",
                "careers", "jobs", "housing", "dining", "parking", "library", "directory",
                "employment",
            ]),
            allow_keywords: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Defaults plus the keywords that mark technology-transfer listings.
    pub fn tech_transfer() -> Self {
        Self {
            allow_keywords: strings(&[
                "technology", "technologies", "tech", "techs", "invention", "inventions",
                "license", "licensing", "patent", "patents", "opportunity", "opportunities",
                "innovation", "innovations", "available", "portfolio", "ip",
            ]),
            ..Self::default()
        }
    }

    /// Add an allow keyword.
    pub fn allow(mut self, keyword: impl Into<String>) -> Self {
        self.allow_keywords.push(keyword.into());
        self
    }

    /// Add a deny term.
    pub fn deny(mut self, term: impl Into<String>) -> Self {
        self.deny_terms.push(term.into());
        self
    }
}

/// Lowercase, non-alphanumerics to spaces, padded so `" term "` matches
/// whole words only.
pub(crate) fn word_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

pub(crate) fn mentions(haystack: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| {
        let needle = word_text(t);
        !needle.trim().is_empty() && haystack.contains(&needle)
    })
}

/// Keyword and pattern based [`LinkFilter`].
#[derive(Debug, Clone, Default)]
pub struct HeuristicFilter {
    config: FilterConfig,
}

impl HeuristicFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn has_denied_extension(&self, url: &Url) -> bool {
        let last = url.path().rsplit('/').next().unwrap_or("");
        match last.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.config.deny_extensions.iter().any(|d| *d == ext)
            }
            None => false,
        }
    }

    fn is_navigation_host(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("").to_lowercase();
        self.config
            .navigation_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
    }
}

impl LinkFilter for HeuristicFilter {
    fn evaluate(&self, candidate: &LinkCandidate<'_>) -> FilterDecision {
        let url_str = candidate.url;
        let Ok(url) = Url::parse(url_str) else {
            return FilterDecision::reject(url_str, FilterReason::InvalidUrl);
        };

        if !matches!(url.scheme(), "http" | "https") {
            return FilterDecision::reject(url_str, FilterReason::UnsupportedScheme);
        }
        if self.has_denied_extension(&url) {
            return FilterDecision::reject(url_str, FilterReason::FileExtension);
        }
        if self.is_navigation_host(&url) {
            return FilterDecision::reject(url_str, FilterReason::Navigation);
        }

        let path_words = word_text(url.path());
        let anchor_words = word_text(candidate.anchor_text);

        // Chrome is judged on the path and the anchor only; context text of a
        // listing row often mentions "license" or "contact" legitimately.
        if mentions(&path_words, &self.config.navigation_terms)
            || mentions(&anchor_words, &self.config.navigation_terms)
        {
            return FilterDecision::reject(url_str, FilterReason::Navigation);
        }
        if mentions(&path_words, &self.config.deny_terms)
            || mentions(&anchor_words, &self.config.deny_terms)
        {
            return FilterDecision::reject(url_str, FilterReason::DenyPattern);
        }

        if self.config.allow_keywords.is_empty() {
            return FilterDecision::pass(url_str, FilterReason::DefaultAllow);
        }

        let context_words = word_text(candidate.surrounding_context);
        let query_words = word_text(url.query().unwrap_or(""));
        if mentions(&path_words, &self.config.allow_keywords)
            || mentions(&anchor_words, &self.config.allow_keywords)
            || mentions(&context_words, &self.config.allow_keywords)
            || mentions(&query_words, &self.config.allow_keywords)
        {
            FilterDecision::pass(url_str, FilterReason::KeywordMatch)
        } else {
            FilterDecision::reject(url_str, FilterReason::NoKeywordMatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decide(filter: &HeuristicFilter, url: &str, anchor: &str, context: &str) -> FilterDecision {
        filter.evaluate(&LinkCandidate::new(url, anchor, context))
    }

    #[test]
    fn test_word_text() {
        assert_eq!(word_text("/user/Log-In"), " user log in ");
        assert_eq!(word_text(""), " ");
    }

    #[test]
    fn test_rejects_navigation() {
        let filter = HeuristicFilter::default();

        let login = decide(&filter, "https://a.edu/user/login", "Sign in", "");
        assert!(!login.passed);
        assert_eq!(login.reason, FilterReason::Navigation);

        let social = decide(&filter, "https://www.linkedin.com/company/a", "LinkedIn", "");
        assert_eq!(social.reason, FilterReason::Navigation);
    }

    #[test]
    fn test_rejects_unrelated_departments() {
        let filter = HeuristicFilter::default();
        let d = decide(&filter, "https://a.edu/athletics/schedule", "Game day", "");
        assert_eq!(d.reason, FilterReason::DenyPattern);
    }

    #[test]
    fn test_rejects_files_and_schemes() {
        let filter = HeuristicFilter::default();
        assert_eq!(
            decide(&filter, "https://a.edu/techs/brochure.PDF", "Brochure", "").reason,
            FilterReason::FileExtension
        );
        assert_eq!(
            decide(&filter, "ftp://a.edu/techs", "FTP", "").reason,
            FilterReason::UnsupportedScheme
        );
        assert_eq!(
            decide(&filter, "nope", "", "").reason,
            FilterReason::InvalidUrl
        );
    }

    #[test]
    fn test_default_allows_listing_links() {
        let filter = HeuristicFilter::default();
        let d = decide(&filter, "https://a.edu/techs/1234", "Novel CRISPR delivery", "");
        assert!(d.passed);
        assert_eq!(d.reason, FilterReason::DefaultAllow);
    }

    #[test]
    fn test_words_not_substrings() {
        // "accounting" must not trip the "account" navigation term
        let filter = HeuristicFilter::default();
        assert!(filter.should_deep_fetch(
            "https://a.edu/techs/accounting-ledger-on-chain",
            "Accounting ledger",
            ""
        ));
    }

    #[test]
    fn test_allow_keywords() {
        let filter = HeuristicFilter::new(FilterConfig::tech_transfer());

        let by_path = decide(&filter, "https://a.edu/technologies/abc", "ABC", "");
        assert_eq!(by_path.reason, FilterReason::KeywordMatch);

        let by_context = decide(
            &filter,
            "https://a.edu/node/77",
            "Antibody panel",
            "Available for licensing: antibody panel",
        );
        assert!(by_context.passed);

        let none = decide(&filter, "https://a.edu/node/78", "Our history", "Founded 1861");
        assert_eq!(none.reason, FilterReason::NoKeywordMatch);
    }

    #[test]
    fn test_deny_wins_over_allow() {
        let filter = HeuristicFilter::new(FilterConfig::tech_transfer());
        let d = decide(&filter, "https://a.edu/careers/technology-jobs", "Tech jobs", "");
        assert_eq!(d.reason, FilterReason::DenyPattern);
    }

    proptest! {
        #[test]
        fn decisions_are_deterministic(
            path in "[a-z/\\-]{0,30}",
            anchor in "[A-Za-z ]{0,20}",
            context in "[A-Za-z ]{0,40}",
        ) {
            let filter = HeuristicFilter::new(FilterConfig::tech_transfer());
            let url = format!("https://a.edu/{}", path);
            let first = decide(&filter, &url, &anchor, &context);
            let second = decide(&filter, &url, &anchor, &context);
            prop_assert_eq!(first, second);
        }
    }
}
