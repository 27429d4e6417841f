//! Persists selected staged results, diverting duplicate-save collisions
//! into the replacement queue.

use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::article::{PendingReplacement, StagedArticle};

#[derive(Debug)]
pub struct StoreOutcome {
    /// Titles of the freshly inserted articles, for the user-visible message.
    pub saved_titles: Vec<String>,
    /// Collisions awaiting per-item confirmation.
    pub queued: Vec<PendingReplacement>,
}

/// Inserts the selected staged results into `folder_id` in one transaction.
/// A staged result whose (url, user, folder) triple already exists is queued
/// as a pending replacement instead of inserted.
pub async fn store_selection(
    pool: &SqlitePool,
    user_id: i64,
    staged: &[StagedArticle],
    selected: &[usize],
    folder_id: i64,
) -> Result<StoreOutcome, AppError> {
    // Folder choices are scoped to owned folders.
    let folder: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM folders WHERE id = ? AND user_id = ?")
            .bind(folder_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    if folder.is_none() {
        return Err(AppError::Forbidden);
    }

    let mut to_insert: Vec<&StagedArticle> = Vec::new();
    let mut queued: Vec<PendingReplacement> = Vec::new();
    for &index in selected {
        let article = staged.get(index).ok_or_else(|| {
            AppError::Validation(format!("Unknown staged result index {index}"))
        })?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM articles WHERE url = ? AND user_id = ? AND folder_id = ?",
        )
        .bind(&article.url)
        .bind(user_id)
        .bind(folder_id)
        .fetch_optional(pool)
        .await?;

        match existing {
            Some((old_id,)) => queued.push(PendingReplacement {
                new: article.clone(),
                folder_id,
                old_id,
            }),
            None => to_insert.push(article),
        }
    }

    // All inserts commit together or not at all.
    let mut tx = pool.begin().await?;
    for article in &to_insert {
        sqlx::query(
            "INSERT INTO articles \
             (url, title, author, date, summary, senti_score, senti_label, tags, user_id, folder_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.author)
        .bind(&article.date)
        .bind(&article.summary)
        .bind(article.senti_score)
        .bind(article.senti_label)
        .bind(&article.tags)
        .bind(user_id)
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(StoreOutcome {
        saved_titles: to_insert
            .iter()
            .map(|a| a.title.clone().unwrap_or_else(|| a.url.clone()))
            .collect(),
        queued,
    })
}
