//! In-memory feed state: items plus the learned profile.

use chrono::{DateTime, Utc};

use crate::error::FeedError;
use crate::models::{ContentItem, NewContentItem, PreferenceProfile};
use crate::preference_learner::PreferenceLearner;
use crate::ranker::{FeedRanker, RankedItem};

/// Owns the feed items and preference profile.
///
/// Scores are never cached; [`FeedStore::ranked`] recomputes them from the
/// current counters and profile on every call.
pub struct FeedStore {
    items: Vec<ContentItem>,
    profile: PreferenceProfile,
    ranker: FeedRanker,
    learner: PreferenceLearner,
    next_id: u64,
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedStore {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<ContentItem>) -> Self {
        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0).saturating_add(1);
        Self {
            items,
            profile: PreferenceProfile::default(),
            ranker: FeedRanker::default(),
            learner: PreferenceLearner::default(),
            next_id,
        }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn profile(&self) -> &PreferenceProfile {
        &self.profile
    }

    pub fn get(&self, id: u64) -> Option<&ContentItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Insert a new item, assigning an id when none was supplied
    pub fn add_item(&mut self, new: NewContentItem, now: DateTime<Utc>) -> Result<ContentItem, FeedError> {
        if new.author.trim().is_empty() {
            return Err(FeedError::InvalidItem("author must not be empty".to_string()));
        }

        let id = match new.id {
            Some(id) if self.get(id).is_some() => return Err(FeedError::DuplicateItem(id)),
            Some(id) => id,
            None => self.next_id,
        };
        // u64::MAX would leave no id for the next item
        let following = id
            .checked_add(1)
            .ok_or_else(|| FeedError::InvalidItem(format!("id {} is out of range", id)))?;
        self.next_id = self.next_id.max(following);

        let item = ContentItem {
            id,
            author: new.author,
            item_type: new.item_type,
            relation: new.relation,
            content: new.content,
            like_count: new.like_count,
            comment_count: new.comment_count,
            created_at: new.created_at.unwrap_or(now),
        };
        self.items.push(item.clone());
        Ok(item)
    }

    /// Like an item: bump its like count by one and reinforce the profile
    pub fn like(&mut self, id: u64) -> Result<ContentItem, FeedError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(FeedError::ItemNotFound(id))?;

        item.like_count = item.like_count.saturating_add(1);
        let liked = item.clone();
        self.learner.record_like(&mut self.profile, &liked);

        Ok(liked)
    }

    /// Current ranking of every item
    pub fn ranked(&self, now: DateTime<Utc>) -> Vec<RankedItem> {
        self.ranker.rank(&self.items, &self.profile, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_item(author: &str, likes: u32) -> NewContentItem {
        NewContentItem {
            id: None,
            author: author.to_string(),
            item_type: "text".to_string(),
            relation: "page".to_string(),
            content: "Top 5 mutual funds".to_string(),
            like_count: likes,
            comment_count: 0,
            created_at: None,
        }
    }

    #[test]
    fn test_add_item_assigns_ids() {
        let now = Utc::now();
        let mut store = FeedStore::new();

        let a = store.add_item(new_item("a", 0), now).unwrap();
        let b = store.add_item(new_item("b", 0), now).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.created_at, now);

        let explicit = store.add_item(NewContentItem { id: Some(10), ..new_item("c", 0) }, now).unwrap();
        assert_eq!(explicit.id, 10);
        let next = store.add_item(new_item("d", 0), now).unwrap();
        assert_eq!(next.id, 11);
    }

    #[test]
    fn test_add_item_rejects_duplicates_and_blank_author() {
        let now = Utc::now();
        let mut store = FeedStore::new();
        store.add_item(NewContentItem { id: Some(3), ..new_item("a", 0) }, now).unwrap();

        assert_eq!(
            store.add_item(NewContentItem { id: Some(3), ..new_item("b", 0) }, now),
            Err(FeedError::DuplicateItem(3))
        );
        assert!(matches!(store.add_item(new_item("  ", 0), now), Err(FeedError::InvalidItem(_))));
    }

    #[test]
    fn test_like_increments_exactly_once_and_learns() {
        let now = Utc::now();
        let mut store = FeedStore::new();
        let item = store.add_item(new_item("Ravi Patel", 15), now).unwrap();

        let before = store.profile().clone();
        let liked = store.like(item.id).unwrap();

        assert_eq!(liked.like_count, 16);
        assert_eq!(store.get(item.id).unwrap().like_count, 16);

        let after = store.profile();
        assert!(after.by_author.get("Ravi Patel") > before.by_author.get("Ravi Patel"));
        assert!(after.by_type.get("text") > before.by_type.get("text"));
        assert!(after.by_relation.get("page") > before.by_relation.get("page"));
    }

    #[test]
    fn test_add_item_rejects_max_id() {
        let now = Utc::now();
        let mut store = FeedStore::new();

        let result = store.add_item(NewContentItem { id: Some(u64::MAX), ..new_item("a", 0) }, now);
        assert!(matches!(result, Err(FeedError::InvalidItem(_))));
        assert!(store.items().is_empty());

        // Id sequence is untouched
        assert_eq!(store.add_item(new_item("b", 0), now).unwrap().id, 1);
    }

    #[test]
    fn test_default_matches_new() {
        let now = Utc::now();
        let mut store = FeedStore::default();
        assert_eq!(store.add_item(new_item("a", 0), now).unwrap().id, 1);
    }

    #[test]
    fn test_like_unknown_item() {
        let mut store = FeedStore::new();
        assert_eq!(store.like(42), Err(FeedError::ItemNotFound(42)));
        assert_eq!(store.profile(), &PreferenceProfile::default());
    }

    #[test]
    fn test_ranked_reflects_latest_likes() {
        let now = Utc::now();
        let old = now - Duration::hours(48);
        let mut store = FeedStore::with_items(vec![]);
        let a = store.add_item(NewContentItem { created_at: Some(old), ..new_item("a", 10) }, now).unwrap();
        let b = store.add_item(NewContentItem { created_at: Some(old), ..new_item("b", 10) }, now).unwrap();

        let first = store.ranked(now);
        assert_eq!(first[0].score, first[1].score);

        store.like(b.id).unwrap();
        let second = store.ranked(now);
        assert_eq!(second[0].item.id, b.id);
        assert!(second[0].score > second[1].score);
        assert_eq!(second[1].item.id, a.id);
    }

    #[test]
    fn test_with_items_continues_ids() {
        let now = Utc::now();
        let seed = ContentItem {
            id: 4,
            author: "Sneha Kapoor".to_string(),
            item_type: "video".to_string(),
            relation: "friend".to_string(),
            content: "My trip to Ladakh".to_string(),
            like_count: 12,
            comment_count: 3,
            created_at: now,
        };
        let mut store = FeedStore::with_items(vec![seed]);
        assert_eq!(store.add_item(new_item("x", 0), now).unwrap().id, 5);
    }
}
