//! Seed file formats.
//!
//! Two shapes are accepted:
//!
//! ```json
//! {"sites": [{"name": "stanford", "url": "https://techfinder.stanford.edu/", "render_js": true}]}
//! {"source_id": "stanford", "urls": [{"url": "https://techfinder.stanford.edu/", "id": "main"}]}
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tto_crawler::SiteSeed;

#[derive(Debug, Deserialize)]
struct UrlEntry {
    url: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Sites {
        sites: Vec<SiteSeed>,
    },
    Urls {
        source_id: String,
        urls: Vec<UrlEntry>,
        #[serde(default)]
        render_js: bool,
    },
}

/// Parse seed file contents into site seeds.
pub fn parse_seeds(raw: &str) -> Result<Vec<SiteSeed>> {
    let file: SeedFile = serde_json::from_str(raw)
        .context("Seed file must contain either a \"sites\" list or \"source_id\" with \"urls\"")?;

    let seeds = match file {
        SeedFile::Sites { sites } => sites,
        SeedFile::Urls {
            source_id,
            urls,
            render_js,
        } => {
            let single = urls.len() == 1;
            urls.into_iter()
                .enumerate()
                .map(|(i, entry)| {
                    let name = match (single, entry.id) {
                        (true, _) => source_id.clone(),
                        (false, Some(id)) => format!("{}:{}", source_id, id),
                        (false, None) => format!("{}:{}", source_id, i + 1),
                    };
                    SiteSeed {
                        name,
                        url: entry.url,
                        render_js,
                    }
                })
                .collect()
        }
    };

    if seeds.is_empty() {
        bail!("Seed file lists no sites");
    }
    Ok(seeds)
}

pub fn load_seeds(path: &Path) -> Result<Vec<SiteSeed>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seeds(&raw).with_context(|| format!("Invalid seed file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_format() {
        let seeds = parse_seeds(
            r#"{"sites": [
                {"name": "mit", "url": "https://tlo.mit.edu/techs"},
                {"name": "stanford", "url": "https://techfinder.stanford.edu/", "render_js": true}
            ]}"#,
        )
        .unwrap();

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0], SiteSeed::new("mit", "https://tlo.mit.edu/techs"));
        assert!(seeds[1].render_js);
    }

    #[test]
    fn test_urls_format() {
        let seeds = parse_seeds(
            r#"{"source_id": "ucsf", "urls": [
                {"url": "https://a.edu/techs", "id": "main"},
                {"url": "https://a.edu/devices"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(seeds[0].name, "ucsf:main");
        assert_eq!(seeds[1].name, "ucsf:2");
        assert!(!seeds[1].render_js);
    }

    #[test]
    fn test_single_url_takes_source_name() {
        let seeds =
            parse_seeds(r#"{"source_id": "ucsf", "urls": [{"url": "https://a.edu/techs"}]}"#)
                .unwrap();
        assert_eq!(seeds[0].name, "ucsf");
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        assert!(parse_seeds(r#"{"sites": []}"#).is_err());
        assert!(parse_seeds(r#"{"targets": []}"#).is_err());
    }
}
