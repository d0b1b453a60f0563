//! Smart Feed Data Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// A post in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: u64,
    pub author: String,
    /// Category tag, e.g. "text", "photo", "video"
    #[serde(rename = "type")]
    pub item_type: String,
    /// Source affinity, e.g. "friend", "closeFriend", "page"
    pub relation: String,
    pub content: String,
    pub like_count: u32,
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    /// Age in hours relative to `now`. Future-dated items count as brand new.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let millis = now.signed_duration_since(self.created_at).num_milliseconds();
        (millis as f64 / 3_600_000.0).max(0.0)
    }
}

/// Item submitted for insertion; the store assigns the id when absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewContentItem {
    #[serde(default)]
    pub id: Option<u64>,
    pub author: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub relation: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Key → multiplier map with a neutral default.
///
/// Any key that has never been learned reads as [`MultiplierMap::NEUTRAL`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MultiplierMap(HashMap<String, f64>);

impl MultiplierMap {
    pub const NEUTRAL: f64 = 1.0;

    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Map with the given keys pre-populated at the neutral value
    pub fn with_neutral_keys(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| (k.to_string(), Self::NEUTRAL)).collect())
    }

    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(Self::NEUTRAL)
    }

    /// Add `delta` to the key's multiplier, starting from neutral when absent.
    /// Returns the new value.
    pub fn bump(&mut self, key: &str, delta: f64) -> f64 {
        let entry = self.0.entry(key.to_string()).or_insert(Self::NEUTRAL);
        *entry += delta;
        *entry
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

/// Learned preferences applied multiplicatively to an item's base score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    pub by_author: MultiplierMap,
    pub by_type: MultiplierMap,
    pub by_relation: MultiplierMap,
}

impl PreferenceProfile {
    /// Combined multiplier for an item (product of the three factors)
    pub fn multiplier_for(&self, item: &ContentItem) -> f64 {
        self.by_type.get(&item.item_type)
            * self.by_relation.get(&item.relation)
            * self.by_author.get(&item.author)
    }
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            by_author: MultiplierMap::new(),
            by_type: MultiplierMap::with_neutral_keys(&["text", "photo", "video"]),
            by_relation: MultiplierMap::with_neutral_keys(&["friend", "closeFriend", "page"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_multiplier_map_defaults_to_neutral() {
        let map = MultiplierMap::new();
        assert_eq!(map.get("anyone"), 1.0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_bump_starts_from_neutral() {
        let mut map = MultiplierMap::new();
        let v = map.bump("Amit Verma", 0.1);
        assert!((v - 1.1).abs() < 1e-12);
        assert!((map.get("Amit Verma") - 1.1).abs() < 1e-12);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_default_profile_keys() {
        let profile = PreferenceProfile::default();
        assert_eq!(profile.by_type.len(), 3);
        assert_eq!(profile.by_relation.len(), 3);
        assert!(profile.by_author.is_empty());
        assert_eq!(profile.by_relation.get("closeFriend"), 1.0);
    }

    #[test]
    fn test_age_hours_clamps_future_items() {
        let now = Utc::now();
        let item = ContentItem {
            id: 1,
            author: "a".to_string(),
            item_type: "text".to_string(),
            relation: "page".to_string(),
            content: String::new(),
            like_count: 0,
            comment_count: 0,
            created_at: now + Duration::hours(2),
        };
        assert_eq!(item.age_hours(now), 0.0);

        let older = ContentItem { created_at: now - Duration::minutes(90), ..item };
        assert!((older.age_hours(now) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_profile_serializes_as_plain_maps() {
        let profile = PreferenceProfile::default();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["byType"]["video"], 1.0);
        assert!(json["byAuthor"].as_object().unwrap().is_empty());
    }
}
