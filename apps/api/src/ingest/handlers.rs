use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::annotate::{join_tags, Annotator};
use crate::auth::middleware::SessionId;
use crate::errors::AppError;
use crate::ingest::extract::ArticleExtractor;
use crate::ingest::search::NewsArticle;
use crate::models::article::StagedArticle;
use crate::state::AppState;

pub const MAX_URLS: usize = 5;
pub const WORD_COUNT_MIN: u32 = 50;
pub const WORD_COUNT_MAX: u32 = 300;

const fn default_count() -> u32 {
    100
}

/// The two submission shapes of the ingestion screen: URL summarization and
/// keyword search. Distinguished by their mandatory field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SummarizationRequest {
    Summarize(SummarizeRequest),
    Search(SearchRequest),
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub urls: Vec<String>,
    #[serde(default = "default_count")]
    pub max_count: u32,
    #[serde(default = "default_count")]
    pub min_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub search: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UrlError {
    pub url: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub staged: usize,
    pub errors: Vec<UrlError>,
    pub next: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub articles: Vec<NewsArticle>,
    pub error_message: Option<String>,
}

/// GET /summarization
pub async fn summarization_view() -> Json<serde_json::Value> {
    Json(json!({
        "max_urls": MAX_URLS,
        "word_count_range": [WORD_COUNT_MIN, WORD_COUNT_MAX],
        "defaults": { "min_count": default_count(), "max_count": default_count() }
    }))
}

/// POST /summarization
pub async fn summarization_submit(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Json(req): Json<SummarizationRequest>,
) -> Result<Response, AppError> {
    match req {
        SummarizationRequest::Summarize(req) => {
            let response = run_summarization(&state, sid, req).await?;
            Ok(Json(response).into_response())
        }
        SummarizationRequest::Search(req) => {
            let response = run_search(&state, &req).await;
            Ok(Json(response).into_response())
        }
    }
}

async fn run_summarization(
    state: &AppState,
    sid: uuid::Uuid,
    req: SummarizeRequest,
) -> Result<SummarizeResponse, AppError> {
    validate_bounds(req.min_count, req.max_count)?;
    let urls = collect_urls(&req.urls)?;

    let mut staged = Vec::new();
    let mut errors = Vec::new();
    for url in urls {
        // One bad URL never aborts the rest of the batch.
        match stage_url(
            &state.extractor,
            state.annotator.as_ref(),
            &url,
            req.max_count,
            req.min_count,
        )
        .await
        {
            Ok(result) => staged.push(result),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "staging failed");
                errors.push(UrlError {
                    url,
                    message: e.to_string(),
                });
            }
        }
    }

    let count = staged.len();
    if count > 0 {
        state
            .sessions
            .append_staged(sid, staged)
            .ok_or(AppError::Unauthorized)?;
    }

    Ok(SummarizeResponse {
        staged: count,
        errors,
        next: "/result",
    })
}

async fn run_search(state: &AppState, req: &SearchRequest) -> SearchResponse {
    match state.news.search(&req.search, &req.sources).await {
        Ok(articles) if articles.is_empty() => SearchResponse {
            articles,
            error_message: Some("No articles found for the keyword.".to_string()),
        },
        Ok(articles) => SearchResponse {
            articles,
            error_message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "news search failed");
            SearchResponse {
                articles: vec![],
                error_message: Some(e.to_string()),
            }
        }
    }
}

/// Extract, summarize, tag, then score the summary's sentiment.
pub async fn stage_url(
    extractor: &ArticleExtractor,
    annotator: &dyn Annotator,
    url: &str,
    max_count: u32,
    min_count: u32,
) -> Result<StagedArticle, AppError> {
    let extracted = extractor
        .fetch(url)
        .await
        .map_err(|e| AppError::External(e.to_string()))?;
    let maintext = extracted.maintext.clone().unwrap_or_default();

    let summary = annotator
        .summarize(&maintext, max_count, min_count)
        .await
        .map_err(|e| AppError::External(e.to_string()))?;
    let keywords = annotator
        .keywords(&maintext)
        .await
        .map_err(|e| AppError::External(e.to_string()))?;
    // Sentiment is scored on the summary, not the full text.
    let sentiment = annotator
        .sentiment(&summary)
        .await
        .map_err(|e| AppError::External(e.to_string()))?;

    Ok(StagedArticle {
        url: url.to_string(),
        title: extracted.title.clone(),
        author: extracted.author(),
        date: extracted.date_publish.clone(),
        summary,
        senti_score: sentiment.score,
        senti_label: sentiment.label,
        tags: join_tags(&keywords),
    })
}

/// Both bounds in [50,300] and min <= max.
pub fn validate_bounds(min_count: u32, max_count: u32) -> Result<(), AppError> {
    for (name, value) in [("min_count", min_count), ("max_count", max_count)] {
        if !(WORD_COUNT_MIN..=WORD_COUNT_MAX).contains(&value) {
            return Err(AppError::Validation(format!(
                "{name} must be between {WORD_COUNT_MIN} and {WORD_COUNT_MAX}"
            )));
        }
    }
    if min_count > max_count {
        return Err(AppError::Validation(
            "min_count must not exceed max_count".to_string(),
        ));
    }
    Ok(())
}

/// First URL mandatory, up to five total; blank optional slots are dropped.
pub fn collect_urls(urls: &[String]) -> Result<Vec<String>, AppError> {
    if urls.first().map(|u| u.trim().is_empty()).unwrap_or(true) {
        return Err(AppError::Validation("The first URL is required".to_string()));
    }
    if urls.len() > MAX_URLS {
        return Err(AppError::Validation(format!(
            "At most {MAX_URLS} URLs per request"
        )));
    }
    Ok(urls
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect())
}
