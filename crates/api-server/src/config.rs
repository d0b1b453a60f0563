use anyhow::{Context, Result};
use price_alerts::NotificationConfig;
use quote_board::DEFAULT_SYMBOLS;
use quote_client::DEFAULT_RATE_LIMIT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FINNHUB_WS_URL: &str = "wss://ws.finnhub.io";
const DEFAULT_EODHD_DAILY_LIMIT: u32 = 20;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,

    // Finnhub (snapshots + trade stream). Streaming is off without a key.
    pub finnhub_api_key: Option<String>,
    pub finnhub_ws_url: String,
    pub finnhub_rest_url: Option<String>,
    pub finnhub_rate_limit: usize,

    // EODHD instrument search
    pub eodhd_api_key: Option<String>,
    pub eodhd_daily_limit: u32,

    pub tracked_symbols: Vec<String>,
    pub cors_origins: Vec<String>,
    pub seed_demo_feed: bool,
    pub notifications: NotificationConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let finnhub_rate_limit = match get("FINNHUB_RATE_LIMIT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("FINNHUB_RATE_LIMIT must be a whole number, got {raw:?}"))?,
            None => DEFAULT_RATE_LIMIT,
        };

        let eodhd_daily_limit = match get("EODHD_DAILY_LIMIT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("EODHD_DAILY_LIMIT must be a whole number, got {raw:?}"))?,
            None => DEFAULT_EODHD_DAILY_LIMIT,
        };

        let tracked_symbols = match get("TRACKED_SYMBOLS") {
            Some(raw) => split_list(&raw).into_iter().map(|s| s.to_uppercase()).collect(),
            None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let seed_demo_feed = get("FEED_SEED_DEMO")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(true);

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            finnhub_api_key: get("FINNHUB_API_KEY"),
            finnhub_ws_url: get("FINNHUB_WS_URL").unwrap_or_else(|| DEFAULT_FINNHUB_WS_URL.to_string()),
            finnhub_rest_url: get("FINNHUB_REST_URL"),
            finnhub_rate_limit,
            eodhd_api_key: get("EODHD_API_KEY"),
            eodhd_daily_limit,
            tracked_symbols,
            cors_origins: get("CORS_ORIGINS").map(|raw| split_list(&raw)).unwrap_or_default(),
            seed_demo_feed,
            notifications: NotificationConfig {
                webhook_url: get("ALERT_WEBHOOK_URL"),
            },
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
