mod eodhd;
mod websocket;

pub use eodhd::EodhdClient;
pub use websocket::{parse_trade_message, FinnhubWebSocket};

use async_trait::async_trait;
use market_core::format::zero_if_missing;
use market_core::{MarketError, QuoteSnapshot, QuoteSource};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Free tier allows 60 calls per minute
pub const DEFAULT_RATE_LIMIT: usize = 60;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Finnhub API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// REST client for Finnhub quote snapshots.
#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FinnhubClient {
    /// `rate_limit` is the number of calls allowed per minute
    pub fn new(api_key: String, rate_limit: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Point the client at a different REST root (e.g. a sandbox or mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, MarketError> {
        let request = builder.build().map_err(|e| MarketError::ApiError(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| MarketError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| MarketError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 5u64;
            tracing::warn!("Finnhub 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(MarketError::RateLimited("Rate limited by Finnhub after 3 retries".to_string()))
    }

    /// Get the current quote for a symbol (price, day range, open, previous close)
    pub async fn get_quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketError> {
        let url = format!("{}/quote", self.base_url);

        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .query(&[("symbol", symbol), ("token", self.api_key.as_str())]),
            )
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::ApiError(format!(
                "Quote HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|e| MarketError::ApiError(e.to_string()))?;

        Ok(quote.into())
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketError> {
        self.get_quote(symbol).await
    }
}

// Quote wire type. Finnhub returns nulls for unknown symbols.
#[derive(Debug, Default, Deserialize)]
struct QuoteResponse {
    #[serde(default, deserialize_with = "zero_if_missing")]
    c: f64,
    #[serde(default, deserialize_with = "zero_if_missing")]
    d: f64,
    #[serde(default, deserialize_with = "zero_if_missing")]
    dp: f64,
    #[serde(default, deserialize_with = "zero_if_missing")]
    h: f64,
    #[serde(default, deserialize_with = "zero_if_missing")]
    l: f64,
    #[serde(default, deserialize_with = "zero_if_missing")]
    o: f64,
    #[serde(default, deserialize_with = "zero_if_missing")]
    pc: f64,
}

impl From<QuoteResponse> for QuoteSnapshot {
    fn from(r: QuoteResponse) -> Self {
        QuoteSnapshot {
            current: r.c,
            change: r.d,
            percent_change: r.dp,
            high: r.h,
            low: r.l,
            open: r.o,
            prev_close: r.pc,
        }
    }
}
