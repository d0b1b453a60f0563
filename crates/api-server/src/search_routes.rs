//! Instrument search backed by the configured symbol-search provider.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_core::SearchPage;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

const MIN_QUERY_LEN: usize = 2;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search text, at least two characters
    #[serde(default)]
    pub q: Option<String>,
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search_instruments))
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching instruments with quota counters", body = SearchPage),
        (status = 400, description = "Query missing or shorter than two characters"),
        (status = 500, description = "Upstream search failed")
    ),
    tag = "Search"
)]
pub async fn search_instruments(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let q = query.q.as_deref().unwrap_or_default();

    if q.chars().count() < MIN_QUERY_LEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Query parameter required (min 2 characters)",
                "results": [],
            })),
        )
            .into_response();
    }

    match state.search.search(q).await {
        Ok(results) => Json(SearchPage {
            results,
            remaining_calls: state.search.remaining_calls(),
            daily_limit: state.search.daily_limit(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(query = q, "Instrument search failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": e.to_string(),
                    "results": [],
                    "remainingCalls": state.search.remaining_calls(),
                })),
            )
                .into_response()
        }
    }
}
