use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use price_alerts::Alert;
use quote_board::StockRow;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Events pushed to subscribers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// A board row after a trade was folded in
    Quote(StockRow),
    Alert(Alert),
}

#[derive(Clone)]
pub struct WsBroadcast {
    events: broadcast::Sender<StreamEvent>,
}

impl Default for WsBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl WsBroadcast {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(2048);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    pub fn publish_quote(&self, row: StockRow) {
        // No subscribers is fine
        let _ = self.events.send(StreamEvent::Quote(row));
    }

    pub fn publish_alert(&self, alert: Alert) {
        let _ = self.events.send(StreamEvent::Alert(alert));
    }
}

// ---------------------------------------------------------------------------
// WebSocket handler: /ws/quotes
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/ws/quotes",
    responses((status = 101, description = "WebSocket upgrade streaming quote rows and alerts")),
    tag = "Quotes"
)]
pub async fn ws_quotes_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_quote_socket(socket, state))
}

async fn handle_quote_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before taking the snapshot so no update falls in between
    let mut rx = state.ws.subscribe();

    let snapshot: Vec<StockRow> = state.board.read().await.rows().to_vec();
    if let Ok(json) = serde_json::to_string(&snapshot) {
        if sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else { continue };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("WS client lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

// ---------------------------------------------------------------------------
// REST fallback: /api/quotes/live
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::IntoParams)]
pub struct LiveQuotesQuery {
    /// Comma-separated symbols; all rows when omitted
    #[serde(default)]
    pub symbols: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/quotes/live",
    params(LiveQuotesQuery),
    responses((status = 200, description = "Latest board rows")),
    tag = "Quotes"
)]
pub async fn get_live_quotes(
    State(state): State<AppState>,
    Query(query): Query<LiveQuotesQuery>,
) -> Json<ApiResponse<Vec<StockRow>>> {
    let board = state.board.read().await;

    let rows: Vec<StockRow> = match &query.symbols {
        Some(symbols) => symbols
            .split(',')
            .filter_map(|s| board.get(s).cloned())
            .collect(),
        None => board.rows().to_vec(),
    };

    Json(ApiResponse::success(rows))
}

pub fn ws_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/quotes", get(ws_quotes_handler))
        .route("/api/quotes/live", get(get_live_quotes))
}
