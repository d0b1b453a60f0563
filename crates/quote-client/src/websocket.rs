use futures_util::{SinkExt, StreamExt};
use market_core::TradeTick;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const FINNHUB_WS_URL: &str = "wss://ws.finnhub.io";

/// Trade stream from Finnhub.
///
/// The connection is opened once. When it drops or errors the stream stops
/// delivering ticks; callers that want fresh data start a new stream.
pub struct FinnhubWebSocket {
    api_key: String,
    url: String,
    tx: broadcast::Sender<TradeTick>,
    subscriptions: Arc<Mutex<HashSet<String>>>,
    shutdown: Arc<Notify>,
}

impl FinnhubWebSocket {
    pub fn new(api_key: String) -> (Self, broadcast::Receiver<TradeTick>) {
        let (tx, rx) = broadcast::channel(1024);
        let ws = Self {
            api_key,
            url: FINNHUB_WS_URL.to_string(),
            tx,
            subscriptions: Arc::new(Mutex::new(HashSet::new())),
            shutdown: Arc::new(Notify::new()),
        };
        (ws, rx)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn sender(&self) -> broadcast::Sender<TradeTick> {
        self.tx.clone()
    }

    pub async fn subscribe(&self, symbols: &[String]) {
        let mut subs = self.subscriptions.lock().await;
        for s in symbols {
            subs.insert(s.to_uppercase());
        }
    }

    pub async fn unsubscribe(&self, symbols: &[String]) {
        let mut subs = self.subscriptions.lock().await;
        for s in symbols {
            subs.remove(&s.to_uppercase());
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Stream trades until the connection closes, errors, or shutdown is requested.
    pub async fn run(&self) {
        match self.connect_and_stream().await {
            Ok(()) => tracing::info!("Finnhub WS stream ended"),
            Err(e) => tracing::warn!("Finnhub WS error: {}, stream stopped", e),
        }
    }

    async fn connect_and_stream(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}?token={}", self.url, self.api_key);
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();
        tracing::info!("Connected to Finnhub WebSocket");

        let symbols: Vec<String> = self.subscriptions.lock().await.iter().cloned().collect();
        for symbol in &symbols {
            let sub_msg = serde_json::json!({"type": "subscribe", "symbol": symbol});
            write.send(Message::Text(sub_msg.to_string())).await?;
        }
        tracing::info!("Subscribed to {} symbols", symbols.len());

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_message(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("Finnhub WS connection closed");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            return Err(Box::new(e));
                        }
                        _ => {}
                    }
                }
                _ = self.shutdown.notified() => {
                    for symbol in &symbols {
                        let unsub_msg = serde_json::json!({"type": "unsubscribe", "symbol": symbol});
                        let _ = write.send(Message::Text(unsub_msg.to_string())).await;
                    }
                    let _ = write.send(Message::Close(None)).await;
                    tracing::info!("Finnhub WS shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    fn handle_message(&self, text: &str) {
        for tick in parse_trade_message(text) {
            // No receivers is not an error; the tick is simply dropped.
            let _ = self.tx.send(tick);
        }
    }
}

/// Parse a Finnhub stream message into trade ticks.
///
/// Only `{"type":"trade","data":[...]}` frames yield ticks. Entries without a
/// symbol or with a missing/zero price are skipped, as are malformed frames.
pub fn parse_trade_message(text: &str) -> Vec<TradeTick> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Ignoring malformed Finnhub frame: {}", e);
            return Vec::new();
        }
    };

    if value.get("type").and_then(|t| t.as_str()) != Some("trade") {
        return Vec::new();
    }

    let Some(data) = value.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };

    data.iter()
        .filter_map(|trade| {
            let symbol = trade.get("s").and_then(|v| v.as_str()).filter(|s| !s.is_empty())?;
            let price = trade.get("p").and_then(|v| v.as_f64()).filter(|p| *p != 0.0)?;
            Some(TradeTick {
                symbol: symbol.to_string(),
                price,
                volume: trade.get("v").and_then(|v| v.as_f64()).unwrap_or(0.0),
                timestamp: trade.get("t").and_then(|v| v.as_i64()).unwrap_or(0),
            })
        })
        .collect()
}
