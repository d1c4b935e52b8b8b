//! URL canonicalization for frontier deduplication.
//!
//! Two URLs that differ only in case of scheme/host, default port, fragment,
//! a trailing slash or the order of query parameters map to the same key.

use url::Url;

use crate::error::{FrontierError, FrontierResult};

/// Normalize a URL string into its canonical dedup key.
pub fn normalize_url(raw: &str) -> FrontierResult<String> {
    let parsed = Url::parse(raw.trim()).map_err(|_| FrontierError::InvalidUrl {
        url: raw.to_string(),
    })?;
    Ok(normalize_parsed(parsed))
}

/// Normalize an already-parsed URL.
///
/// The `url` crate lowercases scheme and host and drops default ports
/// while parsing; this handles the rest.
pub fn normalize_parsed(mut url: Url) -> String {
    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// Host of a URL, lowercased, without a leading `www.`.
pub fn site_host(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_slash_and_fragment() {
        assert_eq!(
            normalize_url("https://tto.example.edu/techs/#top").unwrap(),
            normalize_url("https://tto.example.edu/techs").unwrap()
        );
    }

    #[test]
    fn test_root_keeps_slash() {
        assert_eq!(
            normalize_url("https://Example.EDU").unwrap(),
            "https://example.edu/"
        );
    }

    #[test]
    fn test_query_order_canonicalized() {
        let a = normalize_url("https://example.edu/list?page=2&sort=new").unwrap();
        let b = normalize_url("https://example.edu/list?sort=new&page=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_port_dropped() {
        assert_eq!(
            normalize_url("https://example.edu:443/a").unwrap(),
            normalize_url("https://example.edu/a").unwrap()
        );
    }

    #[test]
    fn test_empty_query_dropped() {
        assert_eq!(
            normalize_url("https://example.edu/a?").unwrap(),
            "https://example.edu/a"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            normalize_url("not a url"),
            Err(FrontierError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_site_host() {
        assert_eq!(
            site_host("https://www.TTO.example.edu/x"),
            Some("tto.example.edu".to_string())
        );
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(
            path in "[a-z]{1,8}(/[a-z0-9]{1,6}){0,3}/?",
            keys in proptest::collection::vec("[a-z]{1,4}", 0..4),
        ) {
            let query: Vec<String> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| format!("{}={}", k, i))
                .collect();
            let raw = if query.is_empty() {
                format!("https://example.edu/{}", path)
            } else {
                format!("https://example.edu/{}?{}", path, query.join("&"))
            };

            let once = normalize_url(&raw).unwrap();
            let twice = normalize_url(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
