//! Feed API Routes
//!
//! Ranked content feed and the like action that trains the preference profile.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use smart_feed::{ContentItem, FeedError, NewContentItem, PreferenceProfile, RankedItem};

use crate::{ApiResponse, AppError, AppState};

fn feed_err(e: FeedError) -> AppError {
    let status = match e {
        FeedError::ItemNotFound(_) => StatusCode::NOT_FOUND,
        FeedError::DuplicateItem(_) => StatusCode::CONFLICT,
        FeedError::InvalidItem(_) => StatusCode::BAD_REQUEST,
    };
    AppError::with_status(status, e)
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct FeedQuery {
    /// Maximum number of items to return
    pub limit: Option<usize>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub items: Vec<RankedItem>,
    pub profile: PreferenceProfile,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikeResponse {
    pub item: ContentItem,
    pub profile: PreferenceProfile,
}

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/feed/items", post(add_feed_item))
        .route("/api/feed/items/:id/like", post(like_feed_item))
}

#[utoipa::path(
    get,
    path = "/api/feed",
    params(FeedQuery),
    responses((status = 200, description = "Feed ranked by score, highest first, with the current profile")),
    tag = "Feed"
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApiResponse<FeedResponse>>, AppError> {
    let feed = state.feed.read().await;
    let mut items = feed.ranked(Utc::now());
    if let Some(limit) = query.limit {
        items.truncate(limit);
    }

    Ok(Json(ApiResponse::success(FeedResponse {
        items,
        profile: feed.profile().clone(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/feed/items",
    request_body = NewContentItem,
    responses(
        (status = 200, description = "Item added"),
        (status = 400, description = "Invalid item"),
        (status = 409, description = "Item id already exists")
    ),
    tag = "Feed"
)]
pub async fn add_feed_item(
    State(state): State<AppState>,
    Json(new_item): Json<NewContentItem>,
) -> Result<Json<ApiResponse<ContentItem>>, AppError> {
    let item = state
        .feed
        .write()
        .await
        .add_item(new_item, Utc::now())
        .map_err(feed_err)?;

    tracing::info!(id = item.id, author = %item.author, "Feed item added");
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/feed/items/{id}/like",
    params(("id" = u64, Path, description = "Feed item id")),
    responses(
        (status = 200, description = "Updated item and preference profile"),
        (status = 404, description = "Unknown item")
    ),
    tag = "Feed"
)]
pub async fn like_feed_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<LikeResponse>>, AppError> {
    let mut feed = state.feed.write().await;
    let item = feed.like(id).map_err(feed_err)?;

    Ok(Json(ApiResponse::success(LikeResponse {
        item,
        profile: feed.profile().clone(),
    })))
}

/// Sample posts loaded at startup when `FEED_SEED_DEMO` is on
pub fn demo_items(now: DateTime<Utc>) -> Vec<ContentItem> {
    let post = |id, author: &str, item_type: &str, relation: &str, content: &str, likes, comments, minutes_ago| {
        ContentItem {
            id,
            author: author.to_string(),
            item_type: item_type.to_string(),
            relation: relation.to_string(),
            content: content.to_string(),
            like_count: likes,
            comment_count: comments,
            created_at: now - Duration::minutes(minutes_ago),
        }
    };

    vec![
        post(1, "Amit Verma", "photo", "friend", "Just adopted a puppy", 20, 3, 90),
        post(2, "Neha Sharma", "video", "closeFriend", "New dance vlog", 40, 10, 300),
        post(3, "Ravi Patel", "text", "page", "Top 5 mutual funds to invest in 2025", 15, 4, 480),
        post(4, "Sneha Kapoor", "video", "friend", "My trip to Ladakh", 12, 3, 30),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_feed::FeedStore;

    #[test]
    fn test_demo_feed_ranking() {
        let now = Utc::now();
        let store = FeedStore::with_items(demo_items(now));
        let ranked = store.ranked(now);

        let order: Vec<u64> = ranked.iter().map(|r| r.item.id).collect();
        assert_eq!(order, vec![2, 1, 4, 3]);
        assert_eq!(ranked[0].score, 38.83);
    }
}
