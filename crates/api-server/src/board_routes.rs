//! Board API Routes
//!
//! Filtered, paginated view of the live board, plus the fundamentals screener.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use quote_board::{
    format_market_cap, BoardFilter, PageEntry, Paginator, ScreenerFilter, ScreenerStock, StockRow, PAGE_SIZE,
};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct BoardQuery {
    /// Case-insensitive symbol substring
    #[serde(default)]
    pub search: String,
    /// Only rows with a positive change
    #[serde(default)]
    pub gainers: bool,
    /// Only rows with a negative change
    #[serde(default)]
    pub losers: bool,
    /// 1-based page number
    pub page: Option<usize>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardPage {
    pub rows: Vec<StockRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// Page numbers with `"..."` marking gaps
    #[schema(value_type = Vec<Object>)]
    pub pages: Vec<PageEntry>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ScreenerRequest {
    pub stocks: Vec<ScreenerStock>,
    #[serde(default)]
    pub filter: ScreenerFilter,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerRow {
    #[serde(flatten)]
    pub stock: ScreenerStock,
    pub market_cap_display: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScreenerResponse {
    pub count: usize,
    pub results: Vec<ScreenerRow>,
}

pub fn board_routes() -> Router<AppState> {
    Router::new()
        .route("/api/board", get(get_board))
        .route("/api/screener", post(run_screener))
}

#[utoipa::path(
    get,
    path = "/api/board",
    params(BoardQuery),
    responses((status = 200, description = "One page of the filtered board", body = BoardPage)),
    tag = "Quotes"
)]
pub async fn get_board(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<ApiResponse<BoardPage>>, AppError> {
    let filter = BoardFilter {
        search: query.search,
        gainers_only: query.gainers,
        losers_only: query.losers,
    };

    let board = state.board.read().await;
    let matching = filter.apply(board.rows());
    let pager = Paginator::new(matching.len(), PAGE_SIZE, query.page.unwrap_or(1));

    Ok(Json(ApiResponse::success(BoardPage {
        rows: pager.slice(&matching).iter().map(|row| (*row).clone()).collect(),
        page: pager.current(),
        total_pages: pager.total_pages(),
        total_items: pager.total_items(),
        pages: pager.page_list(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/screener",
    request_body = ScreenerRequest,
    responses((status = 200, description = "Stocks passing the screener filter", body = ScreenerResponse)),
    tag = "Quotes"
)]
pub async fn run_screener(Json(req): Json<ScreenerRequest>) -> Result<Json<ApiResponse<ScreenerResponse>>, AppError> {
    let results: Vec<ScreenerRow> = req
        .filter
        .apply(&req.stocks)
        .into_iter()
        .map(|stock| ScreenerRow {
            market_cap_display: format_market_cap(stock.market_cap),
            stock,
        })
        .collect();

    Ok(Json(ApiResponse::success(ScreenerResponse {
        count: results.len(),
        results,
    })))
}
