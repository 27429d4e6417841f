//! Client for the article-extraction sidecar: URL in, clean article fields out.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Extraction failed: status {0}")]
    HttpStatus(u16),
    #[error("No article text could be extracted")]
    EmptyContent,
}

impl ExtractError {
    /// True if this error is transient and the request should be retried.
    fn is_retryable(&self) -> bool {
        match self {
            ExtractError::Timeout | ExtractError::Network(_) => true,
            ExtractError::HttpStatus(status) => *status >= 500,
            ExtractError::EmptyContent => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub date_publish: Option<String>,
    pub maintext: Option<String>,
}

impl ExtractedArticle {
    /// First listed author, or the original's "Unknown" placeholder.
    pub fn author(&self) -> String {
        self.authors
            .first()
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

pub struct ArticleExtractor {
    client: Client,
    base_url: String,
}

impl ArticleExtractor {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }

    /// Fetches and extracts one article. The article must yield non-empty
    /// main text to count as extracted.
    pub async fn fetch(&self, url: &str) -> Result<ExtractedArticle, ExtractError> {
        let article = self.fetch_with_retry(url).await?;
        match &article.maintext {
            Some(text) if !text.trim().is_empty() => Ok(article),
            _ => Err(ExtractError::EmptyContent),
        }
    }

    /// Retry transient failures with exponential backoff: 1s, 2s.
    async fn fetch_with_retry(&self, url: &str) -> Result<ExtractedArticle, ExtractError> {
        let mut retry_count = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(article) => return Ok(article),
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES - 1 => {
                    let delay = 1u64 << retry_count;
                    tracing::debug!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_secs = delay,
                        "Retrying article extraction after transient error"
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<ExtractedArticle, ExtractError> {
        let response = self
            .client
            .get(format!("{}/extract", self.base_url))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout
                } else {
                    ExtractError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(ExtractError::HttpStatus(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
