//! Structured details from a technology listing page.
//!
//! Markup-only extraction: no model calls. The result carries a
//! completeness ratio so callers can decide whether a page needs a more
//! expensive pass.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetchers::parse::collapse_whitespace;
use crate::types::page::PageResult;

const MAX_IMAGES: usize = 5;
const MAX_LINKS: usize = 20;

/// Class names that mark a listing's description, in priority order.
const ABSTRACT_CLASSES: &[&str] = &["abstract", "description", "summary", "overview"];

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").unwrap();
    static ref RESEARCHER_CLASS: Regex = Regex::new(r"(?i)inventor|researcher").unwrap();
    static ref CONTACT_CLASS: Regex = Regex::new(r"(?i)contact|licens").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap();
}

/// Details pulled from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    pub url: String,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    /// First sentence of the abstract
    pub summary: Option<String>,
    pub image_urls: Vec<String>,
    pub licensing_contacts: Vec<String>,
    pub researchers: Vec<String>,
    /// Absolute outbound links
    pub extracted_urls: Vec<String>,
}

impl ListingDetails {
    /// Share of the key fields (title, abstract, researchers, licensing
    /// contacts) that are filled, from 0.0 to 1.0.
    pub fn completeness(&self) -> f32 {
        let filled = [
            self.title.is_some(),
            self.abstract_text.is_some(),
            !self.researchers.is_empty(),
            !self.licensing_contacts.is_empty(),
        ]
        .iter()
        .filter(|f| **f)
        .count();
        filled as f32 / 4.0
    }

    /// Text for classification: title, abstract and researchers.
    pub fn classification_text(&self) -> String {
        [
            self.title.as_deref(),
            self.abstract_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .chain(std::iter::once(self.researchers.join(", ")))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

fn text_of(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn class_matches(el: &ElementRef<'_>, pattern: impl Fn(&str) -> bool) -> bool {
    el.value().attr("class").map(pattern).unwrap_or(false)
}

fn first_sentence(text: &str) -> Option<String> {
    let text = text.trim();
    let end = SENTENCE_END
        .find(text)
        .map(|m| m.start() + 1)
        .unwrap_or(text.len());
    let sentence = text[..end].trim();
    (!sentence.is_empty()).then(|| sentence.to_string())
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

/// Extract listing details from raw HTML fetched from `url`.
pub fn extract_listing(html: &str, url: &str) -> ListingDetails {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();
    let mut details = ListingDetails {
        url: url.to_string(),
        ..Default::default()
    };

    details.title = ["h1", "h2", "title"]
        .iter()
        .flat_map(|tag| select(&document, tag).into_iter().take(1))
        .map(|el| text_of(&el))
        .find(|t| !t.is_empty());

    let classed = select(&document, "[class]");
    details.abstract_text = ABSTRACT_CLASSES.iter().find_map(|name| {
        classed
            .iter()
            .find(|el| class_matches(el, |c| c.to_lowercase().contains(name)))
            .map(text_of)
            .filter(|t| !t.is_empty())
    });
    details.summary = details.abstract_text.as_deref().and_then(first_sentence);

    for el in classed
        .iter()
        .filter(|el| class_matches(el, |c| RESEARCHER_CLASS.is_match(c)))
    {
        for name in text_of(el).split(|c: char| c == ',' || c == ';') {
            push_unique(&mut details.researchers, name.trim().to_string());
        }
    }

    for img in select(&document, "img[src]").into_iter().take(MAX_IMAGES) {
        let src = img.value().attr("src").unwrap_or("").trim();
        let resolved = match &base {
            Some(base) => base.join(src).ok(),
            None => Url::parse(src).ok(),
        };
        if let Some(u) = resolved.filter(|u| matches!(u.scheme(), "http" | "https")) {
            push_unique(&mut details.image_urls, u.to_string());
        }
    }

    let anchors = select(&document, "a[href]");
    for a in &anchors {
        let href = a.value().attr("href").unwrap_or("").trim();
        if let Some(address) = href.strip_prefix("mailto:") {
            let address = address.split('?').next().unwrap_or("").trim();
            push_unique(&mut details.licensing_contacts, address.to_lowercase());
        }
    }
    if details.licensing_contacts.is_empty() {
        for el in classed
            .iter()
            .filter(|el| class_matches(el, |c| CONTACT_CLASS.is_match(c)))
        {
            for m in EMAIL.find_iter(&text_of(el)) {
                push_unique(&mut details.licensing_contacts, m.as_str().to_lowercase());
            }
        }
    }

    for a in anchors.iter().take(MAX_LINKS) {
        let href = a.value().attr("href").unwrap_or("").trim();
        if href.starts_with("http://") || href.starts_with("https://") {
            push_unique(&mut details.extracted_urls, href.to_string());
        }
    }

    details
}

/// Extract listing details from a fetched page.
pub fn extract_from_page(page: &PageResult) -> ListingDetails {
    extract_listing(&page.raw_content, &page.final_url)
}
