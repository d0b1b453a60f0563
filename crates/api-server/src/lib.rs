//! Market Pulse API server: adaptive feed, live quote board, price alerts
//! and instrument search over HTTP and WebSocket.

pub mod alert_routes;
pub mod board_routes;
pub mod config;
pub mod feed_routes;
pub mod ingestion;
mod request_id;
pub mod search_routes;
mod security_headers;
pub mod ws_routes;

use anyhow::Context;
use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use market_core::SymbolSearch;
use price_alerts::{AlertEvaluator, NotificationService};
use quote_board::QuoteBoard;
use quote_client::{EodhdClient, FinnhubClient, FinnhubWebSocket};
use serde::Serialize;
use smart_feed::FeedStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use crate::config::ServerConfig;
use crate::ws_routes::WsBroadcast;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<RwLock<FeedStore>>,
    pub alerts: Arc<RwLock<AlertEvaluator>>,
    pub board: Arc<RwLock<QuoteBoard>>,
    pub search: Arc<dyn SymbolSearch>,
    pub notifier: NotificationService,
    pub ws: WsBroadcast,
}

impl AppState {
    pub fn new(
        search: Arc<dyn SymbolSearch>,
        notifier: NotificationService,
        board: QuoteBoard,
        feed: FeedStore,
    ) -> Self {
        Self {
            feed: Arc::new(RwLock::new(feed)),
            alerts: Arc::new(RwLock::new(AlertEvaluator::new())),
            board: Arc::new(RwLock::new(board)),
            search,
            notifier,
            ws: WsBroadcast::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response envelope and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error: an `anyhow::Error` plus the status to report it with.
/// Anything converted with `?` becomes a 500.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.error);
        }

        (self.status, Json(ApiResponse::<()>::error(self.error.to_string()))).into_response()
    }
}

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Market Pulse API",
        description = "Adaptive content feed, live quote board, price alerts and instrument search"
    ),
    paths(
        health_check,
        search_routes::search_instruments,
        feed_routes::get_feed,
        feed_routes::add_feed_item,
        feed_routes::like_feed_item,
        alert_routes::get_alert_history,
        alert_routes::list_thresholds,
        alert_routes::set_threshold,
        alert_routes::remove_threshold,
        board_routes::get_board,
        board_routes::run_screener,
        ws_routes::get_live_quotes,
        ws_routes::ws_quotes_handler,
    ),
    components(schemas(
        smart_feed::ContentItem,
        smart_feed::NewContentItem,
        smart_feed::PreferenceProfile,
        smart_feed::RankedItem,
        price_alerts::Alert,
        price_alerts::AlertKind,
        price_alerts::ThresholdRule,
        quote_board::StockRow,
        quote_board::ScreenerStock,
        quote_board::ScreenerFilter,
        market_core::InstrumentMatch,
        market_core::SearchPage,
        market_core::QuoteSnapshot,
        feed_routes::FeedResponse,
        feed_routes::LikeResponse,
        alert_routes::ThresholdRequest,
        alert_routes::ThresholdEntry,
        board_routes::BoardPage,
        board_routes::ScreenerRequest,
        board_routes::ScreenerResponse,
        ws_routes::StreamEvent,
    )),
    tags(
        (name = "System", description = "Health and documentation"),
        (name = "Search", description = "Instrument search"),
        (name = "Feed", description = "Adaptive content feed"),
        (name = "Alerts", description = "Price thresholds and alert history"),
        (name = "Quotes", description = "Live board, screener and quote stream")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "System"
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "market-pulse-api",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// All routes with tracing, request ids and security headers. CORS is added
/// by the caller.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(search_routes::search_routes())
        .merge(feed_routes::feed_routes())
        .merge(alert_routes::alert_routes())
        .merge(board_routes::board_routes())
        .merge(ws_routes::ws_routes())
        .with_state(state)
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api_server=info,tower_http=info".into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;

    let eodhd_key = config.eodhd_api_key.clone().unwrap_or_else(|| {
        tracing::warn!("EODHD_API_KEY not set; instrument search requests will fail upstream");
        String::new()
    });
    let search: Arc<dyn SymbolSearch> = Arc::new(EodhdClient::new(eodhd_key, config.eodhd_daily_limit));

    let feed = if config.seed_demo_feed {
        FeedStore::with_items(feed_routes::demo_items(Utc::now()))
    } else {
        FeedStore::new()
    };

    let state = AppState::new(
        search,
        NotificationService::new(&config.notifications),
        QuoteBoard::new(&config.tracked_symbols),
        feed,
    );

    let stream = match &config.finnhub_api_key {
        Some(api_key) => {
            let mut rest = FinnhubClient::new(api_key.clone(), config.finnhub_rate_limit);
            if let Some(base_url) = &config.finnhub_rest_url {
                rest = rest.with_base_url(base_url.clone());
            }
            ingestion::seed_board(&rest, &state.board).await;

            let (ws, trades) = FinnhubWebSocket::new(api_key.clone());
            let ws = Arc::new(ws.with_url(config.finnhub_ws_url.clone()));
            ws.subscribe(&config.tracked_symbols).await;

            ingestion::spawn_trade_bridge(state.clone(), trades);
            let runner = ws.clone();
            tokio::spawn(async move { runner.run().await });
            Some(ws)
        }
        None => {
            tracing::warn!("FINNHUB_API_KEY not set; live quotes and snapshot seeding disabled");
            None
        }
    };

    let app = api_router(state).layer(cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("API server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(ws) = stream {
        ws.shutdown();
    }
    tracing::info!("API server stopped");
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use market_core::{InstrumentMatch, MarketError};

    /// Search stub: fixed results, or a failure when `fail` is set
    #[derive(Default)]
    pub struct StubSearch {
        pub fail: bool,
    }

    #[async_trait]
    impl SymbolSearch for StubSearch {
        async fn search(&self, query: &str) -> Result<Vec<InstrumentMatch>, MarketError> {
            if self.fail {
                return Err(MarketError::RateLimited("daily limit reached".to_string()));
            }
            Ok(vec![InstrumentMatch {
                symbol: "AAPL".to_string(),
                exchange: "US".to_string(),
                name: format!("Apple Inc ({query})"),
                instrument_type: "Common Stock".to_string(),
                country: "USA".to_string(),
                currency: "USD".to_string(),
            }])
        }

        fn remaining_calls(&self) -> u32 {
            19
        }

        fn daily_limit(&self) -> u32 {
            20
        }
    }

    pub fn state_with_search(search: StubSearch) -> AppState {
        AppState::new(
            Arc::new(search),
            NotificationService::with_channels(Vec::new()),
            QuoteBoard::with_defaults(),
            FeedStore::with_items(feed_routes::demo_items(Utc::now())),
        )
    }

    pub fn test_state() -> AppState {
        state_with_search(StubSearch::default())
    }
}
