//! Client for the external news-search service (`/v2/everything`).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Error retrieving news: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Error retrieving news: status {0}")]
    HttpStatus(u16),
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    #[error("Error parsing JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

pub struct NewsSearchClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsSearchClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    /// Keyword search across the chosen sources, newest first.
    pub async fn search(
        &self,
        keyword: &str,
        sources: &[String],
    ) -> Result<Vec<NewsArticle>, SearchError> {
        let response = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("sources", &sources.join(",")),
                ("q", keyword),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Err(SearchError::InvalidContentType(content_type));
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        let mut articles = parsed.articles;
        sort_newest_first(&mut articles);
        Ok(articles)
    }
}

/// Publish-timestamp descending; articles without one sink to the bottom.
pub fn sort_newest_first(articles: &mut [NewsArticle]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article(title: &str, published_at: Option<&str>) -> NewsArticle {
        NewsArticle {
            title: Some(title.to_string()),
            description: None,
            url: Some("https://news.example/a".to_string()),
            published_at: published_at.map(String::from),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut articles = vec![
            article("old", Some("2024-01-01T00:00:00Z")),
            article("undated", None),
            article("new", Some("2024-06-01T00:00:00Z")),
        ];
        sort_newest_first(&mut articles);
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_search_sends_key_and_sorts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("apiKey", "k-123"))
            .and(query_param("q", "bitcoin"))
            .and(query_param("sources", "bbc-news,reuters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "articles": [
                    { "title": "Older", "publishedAt": "2024-01-01T00:00:00Z" },
                    { "title": "Newer", "publishedAt": "2024-05-01T00:00:00Z" }
                ]
            })))
            .mount(&server)
            .await;

        let client = NewsSearchClient::new(server.uri(), "k-123".to_string());
        let sources = vec!["bbc-news".to_string(), "reuters".to_string()];
        let articles = client.search("bitcoin", &sources).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title.as_deref(), Some("Newer"));
    }

    #[tokio::test]
    async fn test_non_json_content_type_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html>rate limited</html>"),
            )
            .mount(&server)
            .await;

        let client = NewsSearchClient::new(server.uri(), "k".to_string());
        let err = client.search("bitcoin", &[]).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidContentType(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = NewsSearchClient::new(server.uri(), "bad-key".to_string());
        let err = client.search("bitcoin", &[]).await.unwrap_err();
        assert!(matches!(err, SearchError::HttpStatus(401)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{not json"),
            )
            .mount(&server)
            .await;

        let client = NewsSearchClient::new(server.uri(), "k".to_string());
        let err = client.search("bitcoin", &[]).await.unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }
}
