//! Fetched page types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A link found on a page, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute URL (resolved against the page URL)
    pub url: String,

    /// Visible anchor text, whitespace-collapsed
    pub anchor_text: String,

    /// Text of the enclosing block element, truncated
    pub context: String,

    /// `rel` attribute if present (e.g. "next")
    pub rel: Option<String>,
}

impl Link {
    /// Create a link with just a URL and anchor text.
    pub fn new(url: impl Into<String>, anchor_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anchor_text: anchor_text.into(),
            context: String::new(),
            rel: None,
        }
    }

    /// Set surrounding context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the rel attribute.
    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    /// Whether the link is marked up as the next page.
    pub fn is_rel_next(&self) -> bool {
        self.rel
            .as_deref()
            .map(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("next")))
            .unwrap_or(false)
    }
}

/// Result of fetching one page.
///
/// Ephemeral: owned by the orchestrator for one fetch-process cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    /// HTTP status (200 for rendered pages)
    pub status: u16,

    /// Page body (HTML, or rendered DOM for script-rendered pages)
    pub raw_content: String,

    /// Document title if present
    pub title: Option<String>,

    /// Links in document order, deduplicated
    pub extracted_links: Vec<Link>,

    /// Whether explicit markup advertises a next page
    pub has_next_page: bool,

    /// Explicit next-page URL if found
    pub next_page_url: Option<String>,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,

    /// Whether a headless renderer produced this page
    pub rendered: bool,
}

impl PageResult {
    /// Create a page result with no links.
    pub fn new(url: impl Into<String>, raw_content: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: 200,
            raw_content: raw_content.into(),
            title: None,
            extracted_links: Vec::new(),
            has_next_page: false,
            next_page_url: None,
            fetched_at: Utc::now(),
            rendered: false,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a link.
    pub fn with_link(mut self, link: Link) -> Self {
        self.extracted_links.push(link);
        self
    }

    /// Set the explicit next page.
    pub fn with_next_page(mut self, url: impl Into<String>) -> Self {
        self.has_next_page = true;
        self.next_page_url = Some(url.into());
        self
    }

    /// Just the link URLs, in order.
    pub fn link_urls(&self) -> Vec<&str> {
        self.extracted_links.iter().map(|l| l.url.as_str()).collect()
    }

    /// SHA-256 of the raw content, hex encoded.
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(self.raw_content.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_next_tokens() {
        assert!(Link::new("https://a.edu/2", "2").with_rel("next").is_rel_next());
        assert!(Link::new("https://a.edu/2", "2")
            .with_rel("nofollow Next")
            .is_rel_next());
        assert!(!Link::new("https://a.edu/2", "2").with_rel("prev").is_rel_next());
        assert!(!Link::new("https://a.edu/2", "2").is_rel_next());
    }

    #[test]
    fn test_builder_and_hash() {
        let page = PageResult::new("https://a.edu/techs", "<html></html>")
            .with_title("Techs")
            .with_link(Link::new("https://a.edu/t/1", "Tech 1"))
            .with_next_page("https://a.edu/techs?page=2");

        assert!(page.has_next_page);
        assert_eq!(page.link_urls(), vec!["https://a.edu/t/1"]);
        assert_eq!(page.content_hash().len(), 64);
        assert_eq!(
            page.content_hash(),
            PageResult::new("x", "<html></html>").content_hash()
        );
    }
}
