//! Typed errors for the crawl core.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on the failure kind, e.g. to tell a timeout from a 404.

use thiserror::Error;

/// Errors from a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch exceeded its deadline
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// The server answered with a non-success status
    #[error("HTTP {status} fetching: {url}")]
    Http { url: String, status: u16 },

    /// Transport-level failure (DNS, TLS, connection reset, body read)
    #[error("request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Script rendering failed or no renderer is configured
    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Short machine-readable code used in audit records.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Http { .. } => "http_error",
            FetchError::Request(_) => "request_error",
            FetchError::Render { .. } => "render_error",
            FetchError::InvalidUrl { .. } => "invalid_url",
        }
    }

    /// Whether retrying the same URL can plausibly succeed.
    ///
    /// Client errors other than 408/429 and malformed URLs are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            FetchError::InvalidUrl { .. } => false,
            _ => true,
        }
    }
}

/// Errors raised by the frontier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontierError {
    /// A pagination hop pointed at a URL that is already queued or visited
    #[error("pagination cycle detected: {url}")]
    CycleDetected { url: String },

    /// URL could not be parsed or normalized
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Terminal per-site failures surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SiteCrawlError {
    /// Too many consecutive pages failed permanently
    #[error("failure budget exceeded after {consecutive_failures} consecutive failures ({pages_crawled} pages crawled)")]
    FailureBudgetExceeded {
        pages_crawled: usize,
        consecutive_failures: usize,
    },
}

/// Errors writing crawl records to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O failure writing the record
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from a classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Model endpoint unavailable or returned an error
    #[error("model request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Model answered with something that is not a classification
    #[error("unparseable model response: {0}")]
    Response(String),

    /// Classifier is misconfigured (e.g. missing API key)
    #[error("classifier config error: {0}")]
    Config(String),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for frontier operations.
pub type FrontierResult<T> = std::result::Result<T, FrontierError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Result type alias for classifier operations.
pub type ClassifyResult<T> = std::result::Result<T, ClassifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let server = FetchError::Http {
            url: "https://example.edu".into(),
            status: 503,
        };
        let not_found = FetchError::Http {
            url: "https://example.edu".into(),
            status: 404,
        };
        let throttled = FetchError::Http {
            url: "https://example.edu".into(),
            status: 429,
        };

        assert!(server.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(throttled.is_retryable());
        assert!(FetchError::Timeout { url: "x".into() }.is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FetchError::Timeout { url: "x".into() }.code(), "timeout");
        assert_eq!(
            FetchError::Render {
                url: "x".into(),
                reason: "crash".into()
            }
            .code(),
            "render_error"
        );
    }
}
