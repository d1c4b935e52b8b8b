use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tto_crawler::{ClassifierKind, CrawlConfig};

/// Runner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub output: PathBuf,
    pub classifier: ClassifierKind,
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    pub browser_tabs: usize,
}

/// Parse an optional variable, failing only when it is set but malformed.
fn var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        _ => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut crawl = match env::var("TTO_CRAWL_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read TTO_CRAWL_CONFIG file {}", path))?;
                serde_json::from_str(&raw).with_context(|| {
                    format!("TTO_CRAWL_CONFIG file {} is not a valid crawl config", path)
                })?
            }
            Err(_) => CrawlConfig::default(),
        };

        if let Some(v) = var("TTO_MAX_PAGES")? {
            crawl.max_pages = v;
        }
        if let Some(v) = var("TTO_MAX_DEPTH")? {
            crawl.max_depth = v;
        }
        if let Some(v) = var("TTO_MAX_RETRIES")? {
            crawl.max_retries = v;
        }
        if let Some(v) = var("TTO_FAILURE_BUDGET")? {
            crawl.failure_budget = v;
        }
        if let Some(v) = var("TTO_FETCH_TIMEOUT_MS")? {
            crawl.fetch_timeout_ms = v;
        }
        if let Some(v) = var("TTO_PER_SITE_CONCURRENCY")? {
            crawl.per_site_concurrency = v;
        }
        if let Some(v) = var("TTO_GLOBAL_CONCURRENCY")? {
            crawl.global_concurrency = v;
        }
        if let Some(v) = var("TTO_REQUESTS_PER_SECOND")? {
            crawl.requests_per_second = v;
        }
        if let Some(param) = var::<String>("TTO_PAGE_PARAM")? {
            crawl.pagination.page_param = Some(param);
        }

        Ok(Self {
            crawl,
            output: env::var("TTO_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("crawl-output/records.jsonl")),
            classifier: var("TTO_CLASSIFIER")?.unwrap_or_default(),
            browser_tabs: var("TTO_BROWSER_TABS")?.unwrap_or(4),
        })
    }
}
