/// Annotation client: the single point of entry for all model-service calls.
///
/// ARCHITECTURAL RULE: no other module may call the inference API directly.
/// Summarization, sentiment analysis and keyword extraction all go through
/// this module; the models themselves are opaque hosted services.
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::article::SentimentLabel;

/// The models used for all annotation calls.
/// Intentionally hardcoded to prevent accidental drift.
pub const SUMMARY_MODEL: &str = "facebook/bart-large-cnn";
pub const SENTIMENT_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment";
pub const KEYWORD_MODEL: &str = "ml6team/keyphrase-extraction-kbir-inspec";

const MAX_RETRIES: u32 = 3;
/// At most this many keywords become an article's tags.
const MAX_KEYWORDS: usize = 3;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned empty output")]
    EmptyOutput,

    #[error("Unknown sentiment label '{0}'")]
    UnknownLabel(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Confidence in [0,1], rounded to 3 decimals.
    pub score: f64,
}

/// The annotation seam. `AppState` holds an `Arc<dyn Annotator>` so tests can
/// swap in a stub without touching the handlers.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        max_words: u32,
        min_words: u32,
    ) -> Result<String, AnnotateError>;

    async fn sentiment(&self, text: &str) -> Result<Sentiment, AnnotateError>;

    async fn keywords(&self, text: &str) -> Result<Vec<String>, AnnotateError>;
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Classification output arrives either flat or wrapped per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationOutput {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationOutput {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassificationOutput::Nested(mut nested) => {
                if nested.is_empty() {
                    vec![]
                } else {
                    nested.remove(0)
                }
            }
            ClassificationOutput::Flat(flat) => flat,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeywordSpan {
    word: String,
    score: f64,
}

/// HTTP client for the hosted inference service, with bounded retry on
/// rate limits and model cold starts (the service answers 503 while loading).
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl InferenceClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    async fn call_model<T: DeserializeOwned>(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<T, AnnotateError> {
        let url = format!("{}/models/{model}", self.base_url);
        let mut last_error: Option<AnnotateError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Model call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&url).json(body);
            if let Some(key) = &self.api_key {
                request = request.header("Authorization", format!("Bearer {key}"));
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(AnnotateError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("Inference API returned {status}: {message}");
                last_error = Some(AnnotateError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(AnnotateError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!(model, "model call succeeded");
            return Ok(response.json().await?);
        }

        Err(last_error.unwrap_or(AnnotateError::EmptyOutput))
    }
}

#[async_trait]
impl Annotator for InferenceClient {
    async fn summarize(
        &self,
        text: &str,
        max_words: u32,
        min_words: u32,
    ) -> Result<String, AnnotateError> {
        let body = json!({
            "inputs": text,
            "parameters": { "max_length": max_words, "min_length": min_words }
        });
        let outputs: Vec<SummaryOutput> = self.call_model(SUMMARY_MODEL, &body).await?;
        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .unwrap_or_default();
        if summary.trim().is_empty() {
            return Err(AnnotateError::EmptyOutput);
        }
        Ok(summary)
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment, AnnotateError> {
        let body = json!({ "inputs": text });
        let output: ClassificationOutput = self.call_model(SENTIMENT_MODEL, &body).await?;
        let scores = output.into_scores();
        let best = scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or(AnnotateError::EmptyOutput)?;
        Ok(Sentiment {
            label: map_label(&best.label)?,
            score: round3(best.score),
        })
    }

    async fn keywords(&self, text: &str) -> Result<Vec<String>, AnnotateError> {
        let body = json!({ "inputs": text });
        let mut spans: Vec<KeywordSpan> = self.call_model(KEYWORD_MODEL, &body).await?;
        spans.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut keywords: Vec<String> = Vec::new();
        for span in spans {
            let word = span.word.trim().to_lowercase();
            if word.is_empty() || keywords.contains(&word) {
                continue;
            }
            keywords.push(word);
            if keywords.len() == MAX_KEYWORDS {
                break;
            }
        }
        Ok(keywords)
    }
}

/// Maps the sentiment model's raw labels onto the user-facing ones.
pub fn map_label(raw: &str) -> Result<SentimentLabel, AnnotateError> {
    match raw {
        "LABEL_0" => Ok(SentimentLabel::Negative),
        "LABEL_1" => Ok(SentimentLabel::Neutral),
        "LABEL_2" => Ok(SentimentLabel::Positive),
        other => Err(AnnotateError::UnknownLabel(other.to_string())),
    }
}

pub fn round3(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

pub fn join_tags(keywords: &[String]) -> String {
    keywords.join(", ")
}
