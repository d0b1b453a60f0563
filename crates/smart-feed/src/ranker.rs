//! Feed Ranking Module
//!
//! Scores items by engagement and recency, then applies the learned
//! preference multipliers. Ranking is a pure function of its inputs and is
//! re-run on every change rather than updated incrementally.

use chrono::{DateTime, Utc};
use market_core::format::round2;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ContentItem, PreferenceProfile};

/// Weights for ranking factors
#[derive(Debug, Clone)]
pub struct RankingWeights {
    /// Weight per like
    pub like_weight: f64,
    /// Weight per comment
    pub comment_weight: f64,
    /// Weight for the recency term
    pub recency_weight: f64,
    /// Scale applied to the 0..1 decay factor before weighting
    pub recency_scale: f64,
    /// Hours after which an item gets no recency credit
    pub decay_window_hours: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            like_weight: 0.5,
            comment_weight: 0.3,
            recency_weight: 0.2,
            recency_scale: 100.0,
            decay_window_hours: 24.0,
        }
    }
}

/// An item with its computed score
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankedItem {
    #[serde(flatten)]
    pub item: ContentItem,
    /// Final score, rounded to two decimals
    pub score: f64,
}

/// Ranks feed items by personal relevance
pub struct FeedRanker {
    weights: RankingWeights,
}

impl Default for FeedRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedRanker {
    /// Create a new ranker with default weights
    pub fn new() -> Self {
        Self {
            weights: RankingWeights::default(),
        }
    }

    /// Create ranker with custom weights
    pub fn with_weights(weights: RankingWeights) -> Self {
        Self { weights }
    }

    /// Rank items by score, highest first. Inputs are not modified.
    pub fn rank(
        &self,
        items: &[ContentItem],
        profile: &PreferenceProfile,
        now: DateTime<Utc>,
    ) -> Vec<RankedItem> {
        let mut ranked: Vec<RankedItem> = items
            .iter()
            .map(|item| RankedItem {
                item: item.clone(),
                score: round2(self.score(item, profile, now)),
            })
            .collect();

        // Sort by score (descending)
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked
    }

    /// Linear recency factor in 0..1
    pub fn time_decay(&self, item: &ContentItem, now: DateTime<Utc>) -> f64 {
        (1.0 - item.age_hours(now) / self.weights.decay_window_hours).clamp(0.0, 1.0)
    }

    /// Score before preference multipliers
    pub fn base_score(&self, item: &ContentItem, now: DateTime<Utc>) -> f64 {
        self.weights.like_weight * item.like_count as f64
            + self.weights.comment_weight * item.comment_count as f64
            + self.weights.recency_weight * self.time_decay(item, now) * self.weights.recency_scale
    }

    /// Unrounded final score for a single item
    pub fn score(&self, item: &ContentItem, profile: &PreferenceProfile, now: DateTime<Utc>) -> f64 {
        self.base_score(item, now) * profile.multiplier_for(item)
    }

    /// Get top N items
    pub fn top_n(&self, ranked: &[RankedItem], n: usize) -> Vec<RankedItem> {
        ranked.iter().take(n).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn create_test_item(id: u64, author: &str, item_type: &str, relation: &str, likes: u32, comments: u32, age_hours: f64, now: DateTime<Utc>) -> ContentItem {
        ContentItem {
            id,
            author: author.to_string(),
            item_type: item_type.to_string(),
            relation: relation.to_string(),
            content: format!("post {}", id),
            like_count: likes,
            comment_count: comments,
            created_at: now - Duration::milliseconds((age_hours * 3_600_000.0) as i64),
        }
    }

    fn sample_feed(now: DateTime<Utc>) -> Vec<ContentItem> {
        vec![
            create_test_item(1, "Amit Verma", "photo", "friend", 20, 3, 1.5, now),
            create_test_item(2, "Neha Sharma", "video", "closeFriend", 40, 10, 5.0, now),
            create_test_item(3, "Ravi Patel", "text", "page", 15, 4, 8.0, now),
            create_test_item(4, "Sneha Kapoor", "video", "friend", 12, 3, 0.5, now),
        ]
    }

    #[test]
    fn test_base_score_formula() {
        let now = Utc::now();
        let ranker = FeedRanker::new();
        let item = create_test_item(1, "a", "text", "page", 20, 3, 6.0, now);

        // 0.5*20 + 0.3*3 + 0.2 * (1 - 6/24) * 100 = 10 + 0.9 + 15
        assert_relative_eq!(ranker.base_score(&item, now), 25.9, epsilon = 1e-9);
    }

    #[test]
    fn test_time_decay_bounds() {
        let now = Utc::now();
        let ranker = FeedRanker::new();

        let stale = create_test_item(1, "a", "text", "page", 0, 0, 30.0, now);
        assert_eq!(ranker.time_decay(&stale, now), 0.0);

        let future = ContentItem { created_at: now + Duration::hours(3), ..stale.clone() };
        assert_eq!(ranker.time_decay(&future, now), 1.0);

        let half = create_test_item(2, "a", "text", "page", 0, 0, 12.0, now);
        assert_relative_eq!(ranker.time_decay(&half, now), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_ranking_sorted_and_complete() {
        let now = Utc::now();
        let ranker = FeedRanker::new();
        let items = sample_feed(now);

        let ranked = ranker.rank(&items, &PreferenceProfile::default(), now);

        assert_eq!(ranked.len(), items.len());
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        let mut ids: Vec<u64> = ranked.iter().map(|r| r.item.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        // 0.5*40 + 0.3*10 + 0.2*(1 - 5/24)*100 = 38.83
        assert_eq!(ranked[0].item.id, 2);
        assert_relative_eq!(ranked[0].score, 38.83, epsilon = 1e-9);
    }

    #[test]
    fn test_preferences_multiply_score() {
        let now = Utc::now();
        let ranker = FeedRanker::new();
        let item = create_test_item(1, "Ravi Patel", "text", "page", 10, 0, 30.0, now);

        let mut profile = PreferenceProfile::default();
        profile.by_author.bump("Ravi Patel", 0.5);
        profile.by_type.bump("text", 1.0);

        // base 5.0 * type 2.0 * relation 1.0 * author 1.5
        assert_relative_eq!(ranker.score(&item, &profile, now), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_learned_author_can_reorder_feed() {
        let now = Utc::now();
        let ranker = FeedRanker::new();
        let items = vec![
            create_test_item(1, "popular", "text", "page", 20, 0, 30.0, now),
            create_test_item(2, "favourite", "text", "page", 12, 0, 30.0, now),
        ];

        let mut profile = PreferenceProfile::default();
        assert_eq!(ranker.rank(&items, &profile, now)[0].item.id, 1);

        profile.by_author.bump("favourite", 1.0);
        assert_eq!(ranker.rank(&items, &profile, now)[0].item.id, 2);
    }

    #[test]
    fn test_rank_empty() {
        let ranker = FeedRanker::new();
        assert!(ranker.rank(&[], &PreferenceProfile::default(), Utc::now()).is_empty());
    }

    #[test]
    fn test_custom_weights() {
        let now = Utc::now();
        let ranker = FeedRanker::with_weights(RankingWeights {
            like_weight: 1.0,
            comment_weight: 0.0,
            recency_weight: 0.0,
            ..Default::default()
        });
        let item = create_test_item(1, "a", "text", "page", 7, 100, 0.0, now);
        assert_relative_eq!(ranker.base_score(&item, now), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_top_n() {
        let now = Utc::now();
        let ranker = FeedRanker::new();
        let ranked = ranker.rank(&sample_feed(now), &PreferenceProfile::default(), now);

        let top = ranker.top_n(&ranked, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item.id, ranked[0].item.id);
        assert_eq!(ranker.top_n(&ranked, 10).len(), 4);
    }
}
