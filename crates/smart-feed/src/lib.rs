//! Smart Feed Module
//!
//! Self-learning content feed: ranks items by engagement and recency,
//! weighted by preferences learned from the user's likes.

pub mod error;
pub mod models;
pub mod preference_learner;
pub mod ranker;
pub mod store;

pub use error::FeedError;
pub use models::{ContentItem, MultiplierMap, NewContentItem, PreferenceProfile};
pub use preference_learner::{LearningRates, PreferenceLearner};
pub use ranker::{FeedRanker, RankedItem, RankingWeights};
pub use store::FeedStore;
