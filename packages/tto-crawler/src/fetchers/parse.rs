//! HTML parsing shared by the static and rendered fetchers.
//!
//! Turns a document into a [`PageResult`]: title, links with anchor text
//! and context, and any explicit next-page markup.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::pipeline::pagination::looks_like_next;
use crate::types::page::{Link, PageResult};

/// Longest context snippet kept per link.
const MAX_CONTEXT_CHARS: usize = 200;

/// Elements whose text counts as a link's surrounding context.
const CONTEXT_ELEMENTS: &[&str] = &[
    "p", "li", "td", "tr", "dd", "article", "section", "div",
];

/// Parse an HTML document fetched from `requested_url`.
pub fn parse_page(
    requested_url: &str,
    final_url: &Url,
    status: u16,
    html: String,
    rendered: bool,
) -> PageResult {
    let document = Html::parse_document(&html);

    let title = extract_title(&document);
    let (links, explicit_next) = extract_links(&document, final_url);
    let next_page_url = explicit_next.or_else(|| head_next_link(&document, final_url));

    PageResult {
        url: requested_url.to_string(),
        final_url: final_url.to_string(),
        status,
        raw_content: html,
        title,
        extracted_links: links,
        has_next_page: next_page_url.is_some(),
        next_page_url,
        fetched_at: Utc::now(),
        rendered,
    }
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}

/// `<link rel="next" href="...">` in the document head.
fn head_next_link(document: &Html, base_url: &Url) -> Option<String> {
    let selector = Selector::parse("link[rel][href]").ok()?;
    document
        .select(&selector)
        .find(|el| {
            el.value()
                .attr("rel")
                .map(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("next")))
                .unwrap_or(false)
        })
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| base_url.join(href).ok())
        .map(|u| u.to_string())
}

fn is_skippable_href(href: &str) -> bool {
    let href = href.trim();
    href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
}

/// Nearest block ancestor's text, truncated.
fn surrounding_context(el: &ElementRef<'_>) -> String {
    let block = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| CONTEXT_ELEMENTS.contains(&a.value().name()));

    match block {
        Some(block) => element_text(&block)
            .chars()
            .take(MAX_CONTEXT_CHARS)
            .collect(),
        None => String::new(),
    }
}

/// Whether an anchor is marked up as a next-page control.
fn is_next_anchor(el: &ElementRef<'_>, anchor_text: &str) -> bool {
    let attrs = el.value();
    let rel_next = attrs
        .attr("rel")
        .map(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("next")))
        .unwrap_or(false);
    let class_next = attrs.classes().any(|c| {
        let c = c.to_lowercase();
        c == "next"
            || c.contains("pager-next")
            || c.contains("next-page")
            || c.contains("pagination-next")
    });
    let aria_next = attrs
        .attr("aria-label")
        .map(looks_like_next)
        .unwrap_or(false);

    rel_next || class_next || aria_next || looks_like_next(anchor_text)
}

/// Links in document order (deduplicated) plus the first explicit next link.
fn extract_links(document: &Html, base_url: &Url) -> (Vec<Link>, Option<String>) {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return (Vec::new(), None),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();
    let mut next = None;

    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if is_skippable_href(href) {
            continue;
        }
        let Ok(mut resolved) = base_url.join(href.trim()) else {
            continue;
        };
        resolved.set_fragment(None);
        let resolved = resolved.to_string();

        let mut anchor_text = element_text(&el);
        if anchor_text.is_empty() {
            anchor_text = el
                .value()
                .attr("aria-label")
                .or_else(|| el.value().attr("title"))
                .map(collapse_whitespace)
                .unwrap_or_default();
        }

        if next.is_none() && is_next_anchor(&el, &anchor_text) {
            next = Some(resolved.clone());
        }

        if !seen.insert(resolved.clone()) {
            continue;
        }

        let mut link = Link::new(resolved, anchor_text).with_context(surrounding_context(&el));
        if let Some(rel) = el.value().attr("rel") {
            link = link.with_rel(rel);
        }
        links.push(link);
    }

    (links, next)
}
