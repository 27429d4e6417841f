//! Sentiment comparison: one bucket per label, strongest score first.

use serde::Serialize;

use crate::models::article::{Article, SentimentLabel};

#[derive(Debug, Default, Serialize)]
pub struct SentimentBuckets {
    pub positive: Vec<Article>,
    pub negative: Vec<Article>,
    pub neutral: Vec<Article>,
}

pub fn bucket_by_sentiment(articles: Vec<Article>) -> SentimentBuckets {
    let mut buckets = SentimentBuckets::default();
    for article in articles {
        match article.senti_label {
            SentimentLabel::Positive => buckets.positive.push(article),
            SentimentLabel::Negative => buckets.negative.push(article),
            SentimentLabel::Neutral => buckets.neutral.push(article),
        }
    }
    for bucket in [
        &mut buckets.positive,
        &mut buckets.negative,
        &mut buckets.neutral,
    ] {
        bucket.sort_by(|a, b| b.senti_score.total_cmp(&a.senti_score));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, label: SentimentLabel, score: f64) -> Article {
        Article {
            id,
            url: format!("https://a.example/{id}"),
            title: Some(format!("Article {id}")),
            author: None,
            date: None,
            summary: "s".to_string(),
            senti_score: score,
            senti_label: label,
            tags: None,
            user_id: 1,
            folder_id: 1,
        }
    }

    #[test]
    fn test_mixed_set_splits_into_three_sorted_buckets() {
        let buckets = bucket_by_sentiment(vec![
            article(1, SentimentLabel::Positive, 0.61),
            article(2, SentimentLabel::Negative, 0.99),
            article(3, SentimentLabel::Positive, 0.92),
            article(4, SentimentLabel::Neutral, 0.50),
            article(5, SentimentLabel::Negative, 0.40),
        ]);

        let positive_ids: Vec<i64> = buckets.positive.iter().map(|a| a.id).collect();
        let negative_ids: Vec<i64> = buckets.negative.iter().map(|a| a.id).collect();
        assert_eq!(positive_ids, vec![3, 1]);
        assert_eq!(negative_ids, vec![2, 5]);
        assert_eq!(buckets.neutral.len(), 1);
    }

    #[test]
    fn test_positive_never_lands_in_negative_bucket() {
        let buckets = bucket_by_sentiment(vec![
            article(1, SentimentLabel::Positive, 0.1),
            article(2, SentimentLabel::Negative, 0.9),
        ]);
        assert!(buckets
            .negative
            .iter()
            .all(|a| a.senti_label == SentimentLabel::Negative));
        assert!(buckets
            .positive
            .iter()
            .all(|a| a.senti_label == SentimentLabel::Positive));
    }

    #[test]
    fn test_empty_input_yields_empty_buckets() {
        let buckets = bucket_by_sentiment(vec![]);
        assert!(buckets.positive.is_empty());
        assert!(buckets.negative.is_empty());
        assert!(buckets.neutral.is_empty());
    }
}
