//! Listing classifiers and the configured strategy that picks one.

pub mod heuristic;
pub mod model;

pub use heuristic::{category_scores, CategoryScore, KeywordClassifier, GENERAL_LIFE_SCIENCES};
pub use model::{parse_classification, ModelClassifier, ModelConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyResult;
use crate::traits::classifier::{Classification, Classifier};

/// Which classifier to build, as it appears in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Heuristic,
    ModelBacked,
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "model" | "model_backed" => Ok(Self::ModelBacked),
            other => Err(format!("unknown classifier: {}", other)),
        }
    }
}

/// The classification strategy for a run.
pub enum ClassifierStrategy {
    Heuristic(KeywordClassifier),
    ModelBacked(ModelClassifier),
}

impl ClassifierStrategy {
    /// Build the strategy named by `kind`. Model settings are only needed
    /// (and only read) for [`ClassifierKind::ModelBacked`].
    pub fn from_kind(
        kind: ClassifierKind,
        model: impl FnOnce() -> ClassifyResult<ModelConfig>,
    ) -> ClassifyResult<Self> {
        match kind {
            ClassifierKind::Heuristic => Ok(Self::Heuristic(KeywordClassifier::new())),
            ClassifierKind::ModelBacked => Ok(Self::ModelBacked(ModelClassifier::new(model()?)?)),
        }
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            Self::Heuristic(_) => ClassifierKind::Heuristic,
            Self::ModelBacked(_) => ClassifierKind::ModelBacked,
        }
    }
}

#[async_trait]
impl Classifier for ClassifierStrategy {
    async fn classify(&self, text: &str) -> ClassifyResult<Classification> {
        match self {
            Self::Heuristic(c) => c.classify(text).await,
            Self::ModelBacked(c) => c.classify(text).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Heuristic(c) => c.name(),
            Self::ModelBacked(c) => c.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifyError;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("heuristic".parse::<ClassifierKind>().unwrap(), ClassifierKind::Heuristic);
        assert_eq!("model-backed".parse::<ClassifierKind>().unwrap(), ClassifierKind::ModelBacked);
        assert!("llm".parse::<ClassifierKind>().is_err());
    }

    #[tokio::test]
    async fn test_heuristic_strategy_never_reads_model_config() {
        let strategy = ClassifierStrategy::from_kind(ClassifierKind::Heuristic, || {
            Err(ClassifyError::Config("should not be called".into()))
        })
        .unwrap();

        assert_eq!(strategy.kind(), ClassifierKind::Heuristic);
        let c = strategy.classify("mRNA vaccine with a novel adjuvant").await.unwrap();
        assert_eq!(c.label, "VACCINE");
    }

    #[test]
    fn test_model_strategy_requires_config() {
        let result = ClassifierStrategy::from_kind(ClassifierKind::ModelBacked, || {
            Err(ClassifyError::Config("OPENAI_API_KEY not set".into()))
        });
        assert!(matches!(result, Err(ClassifyError::Config(_))));

        let strategy = ClassifierStrategy::from_kind(ClassifierKind::ModelBacked, || {
            Ok(ModelConfig::new("sk-test"))
        })
        .unwrap();
        assert_eq!(strategy.name(), "model");
    }
}
