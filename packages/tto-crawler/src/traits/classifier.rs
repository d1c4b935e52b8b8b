//! Classifier trait, invoked on crawled listings after the crawl.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyResult;

/// A label with the classifier's confidence in it (0.0 to 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Assigns a category label to listing text.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> ClassifyResult<Classification>;

    /// Classifier name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
