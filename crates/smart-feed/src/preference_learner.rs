//! Preference Learning Module
//!
//! Learns user preferences from likes. Reinforcement only: multipliers grow
//! with every like and never decay or saturate.

use crate::models::{ContentItem, PreferenceProfile};

/// Increment applied to each multiplier on a like
#[derive(Debug, Clone)]
pub struct LearningRates {
    pub author: f64,
    pub item_type: f64,
    pub relation: f64,
}

impl Default for LearningRates {
    fn default() -> Self {
        Self {
            author: 0.1,
            item_type: 0.05,
            relation: 0.05,
        }
    }
}

/// Learns and manages preference multipliers
#[derive(Debug, Clone, Default)]
pub struct PreferenceLearner {
    rates: LearningRates,
}

impl PreferenceLearner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(rates: LearningRates) -> Self {
        Self { rates }
    }

    /// Reinforce the item's author, type and relation after a like
    pub fn record_like(&self, profile: &mut PreferenceProfile, item: &ContentItem) {
        let author = profile.by_author.bump(&item.author, self.rates.author);
        let item_type = profile.by_type.bump(&item.item_type, self.rates.item_type);
        let relation = profile.by_relation.bump(&item.relation, self.rates.relation);

        tracing::debug!(
            item_id = item.id,
            author,
            item_type,
            relation,
            "Updated feed preferences"
        );
    }
}
