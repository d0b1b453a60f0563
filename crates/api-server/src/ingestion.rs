//! Market data ingestion: snapshot seeding and the trade bridge that feeds
//! the board, the alert evaluator, WebSocket subscribers and notifiers.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use market_core::{QuoteSource, TradeTick};
use price_alerts::Alert;
use quote_board::QuoteBoard;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::AppState;

/// Fetch a snapshot for every tracked symbol. Failed symbols keep their
/// zero row. Returns the number of rows seeded.
pub async fn seed_board(source: &dyn QuoteSource, board: &RwLock<QuoteBoard>) -> usize {
    let symbols = board.read().await.symbols();

    let fetches = symbols.iter().map(|symbol| async move { (symbol, source.quote(symbol).await) });
    let results = join_all(fetches).await;

    let mut board = board.write().await;
    let mut seeded = 0;
    for (symbol, result) in results {
        match result {
            Ok(quote) => {
                if board.seed(symbol, quote) {
                    seeded += 1;
                }
            }
            Err(e) => tracing::warn!(symbol = %symbol, "Snapshot fetch failed, using empty row: {}", e),
        }
    }

    tracing::info!("Seeded {}/{} board rows", seeded, symbols.len());
    seeded
}

/// Handle one trade: fold it into the board, evaluate thresholds, then
/// publish the row and any alert. Locks are released before publishing.
pub async fn process_tick(state: &AppState, tick: &TradeTick, now: DateTime<Utc>) -> Option<Alert> {
    let row = state.board.write().await.apply_trade(tick);
    let alert = state.alerts.write().await.on_tick(&tick.symbol, tick.price, now);

    if let Some(row) = row {
        state.ws.publish_quote(row);
    }

    if let Some(alert) = &alert {
        state.ws.publish_alert(alert.clone());
        // Delivery outcomes are logged by the service
        let _ = state.notifier.send_alert(alert.clone());
    }

    alert
}

/// Drain the trade stream until it closes.
pub fn spawn_trade_bridge(state: AppState, mut trades: broadcast::Receiver<TradeTick>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Trade bridge started");
        loop {
            match trades.recv().await {
                Ok(tick) => {
                    process_tick(&state, &tick, Utc::now()).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Trade bridge lagged, skipped {} ticks", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("Trade stream closed, bridge stopped");
    })
}
