use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Session cookie signing secret.
    pub secret_key: String,
    /// API key for the external news-search service.
    pub news_api_key: String,
    pub database_url: String,
    /// Base URL of the hosted model-inference service.
    pub inference_api_url: String,
    /// Optional bearer token for the inference service.
    pub inference_api_key: Option<String>,
    /// Base URL of the article-extraction sidecar.
    pub extractor_url: String,
    pub news_api_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            secret_key: require_env("SECRET_KEY")?,
            news_api_key: require_env("NEWS_API_KEY")?,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://newsfolio.db?mode=rwc".to_string()),
            inference_api_url: std::env::var("INFERENCE_API_URL")
                .unwrap_or_else(|_| "https://api-inference.huggingface.co".to_string()),
            inference_api_key: std::env::var("INFERENCE_API_KEY").ok(),
            extractor_url: std::env::var("EXTRACTOR_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8081".to_string()),
            news_api_url: std::env::var("NEWS_API_URL")
                .unwrap_or_else(|_| "https://newsapi.org".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
