//! One step of the confirm-replace loop: overwrite the old article with the
//! queued data, or leave it untouched.

use sqlx::SqlitePool;

use crate::models::article::{Article, PendingReplacement};

#[derive(Debug, PartialEq)]
pub enum ReplaceAction {
    Updated { title: Option<String> },
    Skipped { title: Option<String> },
    Failed { message: String },
}

impl ReplaceAction {
    pub fn message(&self) -> String {
        match self {
            ReplaceAction::Updated { title } => {
                format!("Article \"{}\" has been updated", title_or_untitled(title))
            }
            ReplaceAction::Skipped { title } => {
                format!("Article \"{}\" was not replaced", title_or_untitled(title))
            }
            ReplaceAction::Failed { message } => format!("Error occurred: {message}"),
        }
    }
}

fn title_or_untitled(title: &Option<String>) -> &str {
    title.as_deref().unwrap_or("Untitled")
}

/// Applies one queued replacement. Failures never abort the loop; they are
/// reported and the queue advances regardless.
pub async fn apply_replacement(
    pool: &SqlitePool,
    user_id: i64,
    item: &PendingReplacement,
    confirm: bool,
) -> ReplaceAction {
    let old: Result<Option<Article>, sqlx::Error> =
        sqlx::query_as("SELECT * FROM articles WHERE id = ? AND user_id = ?")
            .bind(item.old_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await;

    let old = match old {
        Ok(Some(article)) => article,
        Ok(None) => {
            return ReplaceAction::Failed {
                message: "the original article no longer exists".to_string(),
            }
        }
        Err(e) => {
            tracing::error!("replacement lookup failed: {e}");
            return ReplaceAction::Failed {
                message: "a database error occurred".to_string(),
            };
        }
    };

    if !confirm {
        return ReplaceAction::Skipped { title: old.title };
    }

    let result = sqlx::query(
        "UPDATE articles SET title = ?, author = ?, date = ?, summary = ?, \
         senti_score = ?, senti_label = ?, tags = ?, folder_id = ? \
         WHERE id = ? AND user_id = ?",
    )
    .bind(&item.new.title)
    .bind(&item.new.author)
    .bind(&item.new.date)
    .bind(&item.new.summary)
    .bind(item.new.senti_score)
    .bind(item.new.senti_label)
    .bind(&item.new.tags)
    .bind(item.folder_id)
    .bind(item.old_id)
    .bind(user_id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => ReplaceAction::Updated {
            title: old.title,
        },
        Err(e) => {
            tracing::error!("replacement update failed: {e}");
            ReplaceAction::Failed {
                message: "a database error occurred".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::article::{SentimentLabel, StagedArticle};
    use crate::review::store::test_support::{seed_folder, seed_user, staged};
    use crate::review::store::store_selection;

    async fn seed_saved_article(
        pool: &SqlitePool,
        user_id: i64,
        folder_id: i64,
        url: &str,
    ) -> i64 {
        store_selection(pool, user_id, &[staged(url)], &[0], folder_id)
            .await
            .unwrap();
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM articles WHERE url = ?")
            .bind(url)
            .fetch_one(pool)
            .await
            .unwrap();
        id
    }

    fn replacement(url: &str, old_id: i64, folder_id: i64) -> PendingReplacement {
        let new = StagedArticle {
            title: Some("Fresh Headline".to_string()),
            summary: "A fresher summary.".to_string(),
            senti_score: 0.4,
            senti_label: SentimentLabel::Negative,
            tags: "fresh".to_string(),
            ..staged(url)
        };
        PendingReplacement {
            new,
            folder_id,
            old_id,
        }
    }

    #[tokio::test]
    async fn test_confirmed_replacement_overwrites_all_mutable_fields() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "alice").await;
        let folder = seed_folder(&pool, user, "Tech").await;
        let old_id = seed_saved_article(&pool, user, folder, "https://a.example/1").await;

        let action =
            apply_replacement(&pool, user, &replacement("https://a.example/1", old_id, folder), true)
                .await;
        assert!(matches!(action, ReplaceAction::Updated { .. }));

        let row: Article = sqlx::query_as("SELECT * FROM articles WHERE id = ?")
            .bind(old_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.title.as_deref(), Some("Fresh Headline"));
        assert_eq!(row.summary, "A fresher summary.");
        assert_eq!(row.senti_label, SentimentLabel::Negative);
        assert_eq!(row.senti_score, 0.4);
        assert_eq!(row.tags.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_skipped_replacement_leaves_article_untouched() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "alice").await;
        let folder = seed_folder(&pool, user, "Tech").await;
        let old_id = seed_saved_article(&pool, user, folder, "https://a.example/1").await;

        let action = apply_replacement(
            &pool,
            user,
            &replacement("https://a.example/1", old_id, folder),
            false,
        )
        .await;
        assert!(matches!(action, ReplaceAction::Skipped { .. }));

        let row: Article = sqlx::query_as("SELECT * FROM articles WHERE id = ?")
            .bind(old_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.title.as_deref(), Some("Headline"));
        assert_eq!(row.senti_label, SentimentLabel::Positive);
    }

    #[tokio::test]
    async fn test_missing_original_reports_failure() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "alice").await;
        let folder = seed_folder(&pool, user, "Tech").await;

        let action = apply_replacement(
            &pool,
            user,
            &replacement("https://a.example/1", 999, folder),
            true,
        )
        .await;
        assert!(matches!(action, ReplaceAction::Failed { .. }));
    }
}
