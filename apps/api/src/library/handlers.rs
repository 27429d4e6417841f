use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::middleware::CurrentUser;
use crate::errors::AppError;
use crate::library::compare::{bucket_by_sentiment, SentimentBuckets};
use crate::models::article::Article;
use crate::models::folder::Folder;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ArticleIdsRequest {
    pub article_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EditTagsRequest {
    pub tags: String,
}

#[derive(Debug, Serialize)]
pub struct FolderView {
    pub folder: Folder,
    pub articles: Vec<Article>,
}

/// GET /myarticle
pub async fn list_folders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Folder>>, AppError> {
    let folders: Vec<Folder> =
        sqlx::query_as("SELECT * FROM folders WHERE user_id = ? ORDER BY id")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(folders))
}

/// POST /myarticle
pub async fn create_folder_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = create_folder(&state.db, user.id, &req.name).await?;
    Ok(Json(json!({
        "message": "Folder created successfully!",
        "folder_id": id
    })))
}

/// GET /folder/:folder_id
pub async fn view_folder(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(folder_id): Path<i64>,
) -> Result<Json<FolderView>, AppError> {
    let folder = fetch_owned_folder(&state.db, user.id, folder_id).await?;
    let articles: Vec<Article> =
        sqlx::query_as("SELECT * FROM articles WHERE folder_id = ? ORDER BY id")
            .bind(folder.id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(FolderView { folder, articles }))
}

/// POST /delete_folder/:folder_id
pub async fn delete_folder_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(folder_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    delete_folder_cascade(&state.db, user.id, folder_id).await?;
    Ok(Json(json!({
        "message": "Folder deleted successfully!",
        "next": "/myarticle"
    })))
}

/// POST /delete_articles
pub async fn delete_articles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ArticleIdsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = delete_articles_by_ids(&state.db, user.id, &req.article_ids).await?;
    Ok(Json(json!({
        "message": "Successfully deleted",
        "deleted": deleted
    })))
}

/// GET /edit_article/:article_id
pub async fn edit_article_view(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(article_id): Path<i64>,
) -> Result<Json<Article>, AppError> {
    let article = fetch_owned_article(&state.db, user.id, article_id).await?;
    Ok(Json(article))
}

/// POST /edit_article/:article_id
pub async fn edit_article_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(article_id): Path<i64>,
    Json(req): Json<EditTagsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let folder_id = update_tags(&state.db, user.id, article_id, &req.tags).await?;
    Ok(Json(json!({
        "message": "Article tags updated.",
        "next": format!("/folder/{folder_id}")
    })))
}

/// POST /compare_articles
pub async fn compare_articles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ArticleIdsRequest>,
) -> Result<Json<SentimentBuckets>, AppError> {
    let articles = fetch_owned_articles(&state.db, user.id, &req.article_ids).await?;
    Ok(Json(bucket_by_sentiment(articles)))
}

// ── store operations ───────────────────────────────────────────────────────

pub async fn create_folder(pool: &SqlitePool, user_id: i64, name: &str) -> Result<i64, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Folder name is required".to_string()));
    }
    let result = sqlx::query("INSERT INTO folders (name, created_at, user_id) VALUES (?, ?, ?)")
        .bind(name)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Deletes the folder's articles and the folder itself in one transaction.
pub async fn delete_folder_cascade(
    pool: &SqlitePool,
    user_id: i64,
    folder_id: i64,
) -> Result<(), AppError> {
    fetch_owned_folder(pool, user_id, folder_id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM articles WHERE folder_id = ?")
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM folders WHERE id = ?")
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Bulk delete within a single commit, restricted to the caller's rows.
pub async fn delete_articles_by_ids(
    pool: &SqlitePool,
    user_id: i64,
    article_ids: &[i64],
) -> Result<u64, AppError> {
    if article_ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; article_ids.len()].join(", ");
    let sql =
        format!("DELETE FROM articles WHERE user_id = ? AND id IN ({placeholders})");
    let mut query = sqlx::query(&sql).bind(user_id);
    for id in article_ids {
        query = query.bind(id);
    }

    let mut tx = pool.begin().await?;
    let result = query.execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}

pub async fn update_tags(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
    tags: &str,
) -> Result<i64, AppError> {
    let article = fetch_owned_article(pool, user_id, article_id).await?;
    sqlx::query("UPDATE articles SET tags = ? WHERE id = ?")
        .bind(tags)
        .bind(article.id)
        .execute(pool)
        .await?;
    Ok(article.folder_id)
}

async fn fetch_owned_folder(
    pool: &SqlitePool,
    user_id: i64,
    folder_id: i64,
) -> Result<Folder, AppError> {
    let folder: Option<Folder> = sqlx::query_as("SELECT * FROM folders WHERE id = ?")
        .bind(folder_id)
        .fetch_optional(pool)
        .await?;
    let folder = folder.ok_or_else(|| AppError::NotFound(format!("Folder {folder_id} not found")))?;
    if folder.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(folder)
}

async fn fetch_owned_article(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> Result<Article, AppError> {
    let article: Option<Article> = sqlx::query_as("SELECT * FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(pool)
        .await?;
    let article =
        article.ok_or_else(|| AppError::NotFound(format!("Article {article_id} not found")))?;
    if article.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(article)
}

async fn fetch_owned_articles(
    pool: &SqlitePool,
    user_id: i64,
    article_ids: &[i64],
) -> Result<Vec<Article>, AppError> {
    if article_ids.is_empty() {
        return Ok(vec![]);
    }
    let placeholders = vec!["?"; article_ids.len()].join(", ");
    let sql = format!("SELECT * FROM articles WHERE user_id = ? AND id IN ({placeholders})");
    let mut query = sqlx::query_as(&sql).bind(user_id);
    for id in article_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}
