//! Alert API Routes
//!
//! Threshold registration and the recent alert history.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use price_alerts::{Alert, AlertError, ThresholdRule};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

fn rule_err(e: AlertError) -> AppError {
    AppError::with_status(StatusCode::BAD_REQUEST, e)
}

/// Register a rule. Omitted or zero bounds fall back to 0 (lower) and
/// unbounded (upper); at least one bound is required.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ThresholdRequest {
    pub symbol: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ThresholdEntry {
    pub symbol: String,
    #[serde(flatten)]
    pub rule: ThresholdRule,
}

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/api/alerts", get(get_alert_history))
        .route("/api/alerts/thresholds", get(list_thresholds).post(set_threshold))
        .route("/api/alerts/thresholds/:symbol", delete(remove_threshold))
}

#[utoipa::path(
    get,
    path = "/api/alerts",
    responses((status = 200, description = "Recent alerts, newest first", body = Vec<Alert>)),
    tag = "Alerts"
)]
pub async fn get_alert_history(State(state): State<AppState>) -> Json<ApiResponse<Vec<Alert>>> {
    let history = state.alerts.read().await.history().to_vec();
    Json(ApiResponse::success(history))
}

#[utoipa::path(
    get,
    path = "/api/alerts/thresholds",
    responses((status = 200, description = "Registered threshold rules", body = Vec<ThresholdEntry>)),
    tag = "Alerts"
)]
pub async fn list_thresholds(State(state): State<AppState>) -> Json<ApiResponse<Vec<ThresholdEntry>>> {
    let entries = state
        .alerts
        .read()
        .await
        .rules()
        .entries()
        .into_iter()
        .map(|(symbol, rule)| ThresholdEntry { symbol, rule })
        .collect();
    Json(ApiResponse::success(entries))
}

#[utoipa::path(
    post,
    path = "/api/alerts/thresholds",
    request_body = ThresholdRequest,
    responses(
        (status = 200, description = "Rule stored, replacing any previous rule for the symbol"),
        (status = 400, description = "Missing symbol, no bounds, or lower above upper")
    ),
    tag = "Alerts"
)]
pub async fn set_threshold(
    State(state): State<AppState>,
    Json(req): Json<ThresholdRequest>,
) -> Result<Json<ApiResponse<ThresholdEntry>>, AppError> {
    let symbol = req.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::with_status(
            StatusCode::BAD_REQUEST,
            anyhow::anyhow!("symbol is required"),
        ));
    }

    let rule = ThresholdRule::from_bounds(req.lower, req.upper).map_err(rule_err)?;
    state.alerts.write().await.set_rule(&symbol, rule);

    tracing::info!(symbol = %symbol, lower = rule.lower, upper = rule.upper, "Threshold set");
    Ok(Json(ApiResponse::success(ThresholdEntry { symbol, rule })))
}

#[utoipa::path(
    delete,
    path = "/api/alerts/thresholds/{symbol}",
    params(("symbol" = String, Path, description = "Ticker symbol")),
    responses(
        (status = 200, description = "Rule removed"),
        (status = 404, description = "No rule for symbol")
    ),
    tag = "Alerts"
)]
pub async fn remove_threshold(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<ThresholdEntry>>, AppError> {
    let symbol = symbol.trim().to_uppercase();
    let rule = state.alerts.write().await.remove_rule(&symbol).ok_or_else(|| {
        AppError::with_status(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("No threshold registered for {symbol}"),
        )
    })?;

    Ok(Json(ApiResponse::success(ThresholdEntry { symbol, rule })))
}
