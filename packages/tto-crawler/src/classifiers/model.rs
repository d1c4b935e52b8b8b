//! Classifier backed by an OpenAI-compatible chat completion endpoint.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClassifyError, ClassifyResult};
use crate::traits::classifier::{Classification, Classifier};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Longest input sent to the model, in characters.
const MAX_INPUT_CHARS: usize = 12_000;

/// Settings for [`ModelClassifier`].
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    /// Allowed labels; empty lets the model choose freely
    pub labels: Vec<String>,
    pub timeout: Duration,
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            labels: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Read `OPENAI_API_KEY`, and optionally `OPENAI_BASE_URL` and
    /// `OPENAI_MODEL`.
    pub fn from_env() -> ClassifyResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ClassifyError::Config("OPENAI_API_KEY not set".into()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    label: String,
    #[serde(default)]
    confidence: f32,
}

/// Parse a `{"label", "confidence"}` object out of a model reply,
/// tolerating a markdown code fence around it.
pub fn parse_classification(content: &str) -> ClassifyResult<Classification> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    let raw: RawClassification = serde_json::from_str(body)
        .map_err(|e| ClassifyError::Response(format!("{}: {}", e, body)))?;

    let label = raw.label.trim();
    if label.is_empty() {
        return Err(ClassifyError::Response("empty label".into()));
    }
    Ok(Classification::new(label, raw.confidence))
}

/// Asks a chat model for a label and a confidence.
pub struct ModelClassifier {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ModelClassifier {
    pub fn new(config: ModelConfig) -> ClassifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifyError::Request(Box::new(e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "Classify the technology listing. Reply with a JSON object \
             {\"label\": string, \"confidence\": number between 0 and 1}.",
        );
        if !self.config.labels.is_empty() {
            prompt.push_str(" The label must be one of: ");
            prompt.push_str(&self.config.labels.join(", "));
            prompt.push('.');
        }
        prompt
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    async fn classify(&self, text: &str) -> ClassifyResult<Classification> {
        let input: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            temperature: 0.0,
            response_format: serde_json::json!({ "type": "json_object" }),
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "classifier request failed");
                ClassifyError::Request(Box::new(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "classifier API error");
            return Err(ClassifyError::Response(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Response(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifyError::Response("no choices in response".into()))?;

        let classification = parse_classification(&content)?;
        if !self.config.labels.is_empty() && !self.config.labels.contains(&classification.label) {
            return Err(ClassifyError::Response(format!(
                "label outside the allowed set: {}",
                classification.label
            )));
        }

        debug!(
            model = %self.config.model,
            label = %classification.label,
            confidence = classification.confidence,
            duration_ms = start.elapsed().as_millis() as u64,
            "model classification"
        );
        Ok(classification)
    }

    fn name(&self) -> &str {
        "model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let c = parse_classification(r#"{"label": "VACCINE", "confidence": 0.82}"#).unwrap();
        assert_eq!(c.label, "VACCINE");
        assert!((c.confidence - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_parse_fenced_json_and_clamp() {
        let c = parse_classification("```json\n{\"label\": \"BIOLOGIC\", \"confidence\": 7}\n```")
            .unwrap();
        assert_eq!(c.label, "BIOLOGIC");
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_classification("I think it's a vaccine"),
            Err(ClassifyError::Response(_))
        ));
        assert!(parse_classification(r#"{"label": "  "}"#).is_err());
    }

    #[test]
    fn test_prompt_lists_labels() {
        let classifier =
            ModelClassifier::new(ModelConfig::new("sk-test").with_labels(["A", "B"])).unwrap();
        assert!(classifier.system_prompt().contains("one of: A, B."));
    }

    #[test]
    fn test_key_is_not_debug_printed() {
        let config = ModelConfig::new("sk-very-secret");
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }
}
