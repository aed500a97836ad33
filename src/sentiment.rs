use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8085/classify";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_CHARS: usize = 2000;
const DEFAULT_NEUTRAL_LABEL: &str = "NEUTRAL";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("classifier returned status {0}")]
    Status(StatusCode),
    #[error("classifier response carried no prediction")]
    EmptyPrediction,
}

/// Top-ranked label as the model emitted it, before polarity mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub confidence: f64,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<RawPrediction, ClassifierError>;
}

/// Classifier endpoint settings plus the label vocabulary map. The map is
/// configuration, not code: deployments running models with different
/// vocabularies (POSITIVE/NEGATIVE/NEUTRAL vs POS/NEG/NEU) load different
/// files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_chars: usize,
    pub neutral_label: String,
    pub labels: HashMap<String, f64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_chars: DEFAULT_MAX_CHARS,
            neutral_label: DEFAULT_NEUTRAL_LABEL.to_string(),
            labels: HashMap::from([
                ("POSITIVE".to_string(), 1.0),
                ("NEGATIVE".to_string(), -1.0),
                ("NEUTRAL".to_string(), 0.0),
            ]),
        }
    }
}

impl ClassifierConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read classifier config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("invalid classifier config {}", path.display()))?;
        Ok(config)
    }

    /// Polarity for a model label. Labels outside the map score 0.0.
    pub fn score_for(&self, label: &str) -> f64 {
        self.labels.get(label).copied().unwrap_or(0.0)
    }
}

pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<RawPrediction, ClassifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        parse_prediction(&body).ok_or(ClassifierError::EmptyPrediction)
    }
}

// Hosted text-classification endpoints answer either [{label, score}] or
// [[{label, score}, ...]] ranked best-first; take the top entry.
fn parse_prediction(body: &Value) -> Option<RawPrediction> {
    let first = body.as_array()?.first()?;
    let entry = if first.is_array() {
        first.as_array()?.first()?
    } else {
        first
    };

    Some(RawPrediction {
        label: entry.get("label")?.as_str()?.to_string(),
        confidence: entry.get("score")?.as_f64()?,
    })
}

/// The scorer's answer. `inference_failed` marks a fabricated neutral
/// fallback; it is surfaced to callers but never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentOutcome {
    pub label: String,
    pub score: f64,
    pub confidence: f64,
    pub inference_failed: bool,
}

pub struct SentimentAnalyzer {
    classifier: Box<dyn Classifier>,
    config: ClassifierConfig,
}

impl SentimentAnalyzer {
    /// Build the analyzer with its HTTP classifier. The client (and its
    /// timeout) is constructed once per process, not per request.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let classifier = HttpClassifier::new(&config)?;
        Ok(Self::with_classifier(Box::new(classifier), config))
    }

    pub fn with_classifier(classifier: Box<dyn Classifier>, config: ClassifierConfig) -> Self {
        Self { classifier, config }
    }

    /// Score a piece of text. Never errors: any failure at the classifier
    /// boundary becomes a neutral result with confidence 1.0 (kept for parity
    /// with the deployed behavior) and `inference_failed` set.
    pub async fn analyze(&self, text: &str) -> SentimentOutcome {
        let input = truncate_chars(text, self.config.max_chars);
        match self.classifier.classify(input).await {
            Ok(prediction) => {
                debug!(label = %prediction.label, "classifier prediction");
                SentimentOutcome {
                    score: self.config.score_for(&prediction.label),
                    confidence: prediction.confidence,
                    label: prediction.label,
                    inference_failed: false,
                }
            }
            Err(error) => {
                warn!("sentiment inference failed, falling back to neutral: {error}");
                SentimentOutcome {
                    label: self.config.neutral_label.clone(),
                    score: 0.0,
                    confidence: 1.0,
                    inference_failed: true,
                }
            }
        }
    }
}

// Cap input length on a char boundary before it reaches the classifier.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        label: &'static str,
        confidence: f64,
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<RawPrediction, ClassifierError> {
            Ok(RawPrediction {
                label: self.label.to_string(),
                confidence: self.confidence,
            })
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> Result<RawPrediction, ClassifierError> {
            Err(ClassifierError::EmptyPrediction)
        }
    }

    fn analyzer_with(classifier: Box<dyn Classifier>) -> SentimentAnalyzer {
        SentimentAnalyzer::with_classifier(classifier, ClassifierConfig::default())
    }

    #[tokio::test]
    async fn positive_label_maps_to_positive_polarity() {
        let analyzer = analyzer_with(Box::new(FixedClassifier {
            label: "POSITIVE",
            confidence: 0.98,
        }));
        let outcome = analyzer.analyze("Great tool!").await;
        assert_eq!(outcome.label, "POSITIVE");
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.confidence, 0.98);
        assert!(!outcome.inference_failed);
    }

    #[tokio::test]
    async fn unknown_label_scores_zero() {
        let analyzer = analyzer_with(Box::new(FixedClassifier {
            label: "LABEL_3",
            confidence: 0.55,
        }));
        let outcome = analyzer.analyze("hmm").await;
        assert_eq!(outcome.score, 0.0);
        assert!(!outcome.inference_failed);
    }

    #[tokio::test]
    async fn failure_becomes_confident_neutral() {
        let analyzer = analyzer_with(Box::new(FailingClassifier));
        let outcome = analyzer.analyze("anything").await;
        assert_eq!(
            outcome,
            SentimentOutcome {
                label: "NEUTRAL".to_string(),
                score: 0.0,
                confidence: 1.0,
                inference_failed: true,
            }
        );
    }

    #[tokio::test]
    async fn alternate_vocabulary_loads_from_toml() {
        let config: ClassifierConfig = toml::from_str(
            r#"
            neutral_label = "NEU"

            [labels]
            POS = 1.0
            NEG = -1.0
            NEU = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.score_for("POS"), 1.0);
        assert_eq!(config.score_for("NEG"), -1.0);
        assert_eq!(config.score_for("POSITIVE"), 0.0);

        let analyzer =
            SentimentAnalyzer::with_classifier(Box::new(FailingClassifier), config);
        let outcome = analyzer.analyze("text").await;
        assert_eq!(outcome.label, "NEU");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn parse_prediction_handles_flat_and_nested_shapes() {
        let flat: Value =
            serde_json::json!([{ "label": "POSITIVE", "score": 0.99 }]);
        let nested: Value =
            serde_json::json!([[{ "label": "NEG", "score": 0.87 }, { "label": "POS", "score": 0.13 }]]);

        assert_eq!(
            parse_prediction(&flat).unwrap(),
            RawPrediction {
                label: "POSITIVE".to_string(),
                confidence: 0.99,
            }
        );
        assert_eq!(parse_prediction(&nested).unwrap().label, "NEG");
        assert!(parse_prediction(&serde_json::json!([])).is_none());
        assert!(parse_prediction(&serde_json::json!({ "error": "busy" })).is_none());
    }
}
