use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Sentiment classification label. Stored verbatim as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Publish date as reported by the extractor, kept free-text.
    pub date: Option<String>,
    pub summary: String,
    pub senti_score: f64,
    pub senti_label: SentimentLabel,
    pub tags: Option<String>,
    pub user_id: i64,
    pub folder_id: i64,
}

/// An annotated ingestion result held in the session, awaiting selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedArticle {
    pub url: String,
    pub title: Option<String>,
    pub author: String,
    pub date: Option<String>,
    pub summary: String,
    pub senti_score: f64,
    pub senti_label: SentimentLabel,
    pub tags: String,
}

/// A duplicate-save collision queued for per-item user confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReplacement {
    pub new: StagedArticle,
    pub folder_id: i64,
    pub old_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_label_serde_roundtrip() {
        for (label, text) in [
            (SentimentLabel::Positive, "\"Positive\""),
            (SentimentLabel::Neutral, "\"Neutral\""),
            (SentimentLabel::Negative, "\"Negative\""),
        ] {
            assert_eq!(serde_json::to_string(&label).unwrap(), text);
            let back: SentimentLabel = serde_json::from_str(text).unwrap();
            assert_eq!(back, label);
        }
    }

    #[test]
    fn test_sentiment_label_display() {
        assert_eq!(SentimentLabel::Neutral.to_string(), "Neutral");
    }
}
