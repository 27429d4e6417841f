use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::middleware::{CurrentUser, SessionId};
use crate::errors::AppError;
use crate::models::article::{Article, StagedArticle};
use crate::models::folder::Folder;
use crate::review::replace::apply_replacement;
use crate::review::store::store_selection;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub results: Vec<StagedArticle>,
    pub folders: Vec<Folder>,
}

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    /// Indices into the staged-results buffer.
    pub articles: Vec<usize>,
    pub folder: i64,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmReplaceRequest {
    pub confirm: bool,
}

/// GET /result
pub async fn result_view(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Result<Json<ResultView>, AppError> {
    let results = state.sessions.staged(sid);
    let folders: Vec<Folder> =
        sqlx::query_as("SELECT * FROM folders WHERE user_id = ? ORDER BY id")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(ResultView { results, folders }))
}

/// POST /result
pub async fn store_selected(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let staged = state.sessions.staged(sid);
    let outcome = store_selection(&state.db, user.id, &staged, &req.articles, req.folder).await?;

    let message = if outcome.saved_titles.is_empty() {
        "No new articles were stored".to_string()
    } else {
        format!(
            "Selected new articles have been stored successfully: {}",
            outcome.saved_titles.join(", ")
        )
    };

    // Collisions route into the sequential confirm-replace workflow; the
    // staged results themselves stay available for further selection.
    let queued = outcome.queued.len();
    let next = if queued > 0 {
        state
            .sessions
            .set_replacements(sid, outcome.queued)
            .ok_or(AppError::Unauthorized)?;
        "/confirm_replace"
    } else {
        "/result"
    };

    Ok(Json(json!({
        "message": message,
        "stored": outcome.saved_titles.len(),
        "queued": queued,
        "next": next
    })))
}

/// GET /confirm_replace
/// Shows the head of the replacement queue, enriched with the existing
/// article and the destination folder name. An empty queue is terminal.
pub async fn confirm_replace_view(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Result<Json<serde_json::Value>, AppError> {
    let queue = state.sessions.replacements(sid);
    let Some(head) = queue.first() else {
        return Ok(Json(json!({ "done": true, "next": "/result" })));
    };

    let old: Option<Article> =
        sqlx::query_as("SELECT * FROM articles WHERE id = ? AND user_id = ?")
            .bind(head.old_id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;
    let folder_name: Option<(String,)> = sqlx::query_as("SELECT name FROM folders WHERE id = ?")
        .bind(head.folder_id)
        .fetch_optional(&state.db)
        .await?;

    Ok(Json(json!({
        "done": false,
        "new": &head.new,
        "old": old,
        "new_folder_name": folder_name.map(|(name,)| name),
        "remaining": queue.len()
    })))
}

/// POST /confirm_replace
/// Consumes exactly one queued item per request: confirmed items overwrite
/// the old article, skipped items leave it untouched.
pub async fn confirm_replace_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Json(req): Json<ConfirmReplaceRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some((head, remaining)) = state.sessions.pop_replacement(sid) else {
        return Ok(Json(json!({ "done": true, "next": "/result" })));
    };

    let action = apply_replacement(&state.db, user.id, &head, req.confirm).await;

    let next = if remaining > 0 {
        "/confirm_replace"
    } else {
        "/result"
    };
    Ok(Json(json!({
        "message": action.message(),
        "remaining": remaining,
        "next": next
    })))
}
