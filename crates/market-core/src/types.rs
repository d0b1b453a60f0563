use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single trade print from the streaming feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TradeTick {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub volume: f64,
    /// Exchange timestamp in milliseconds since the epoch
    pub timestamp: i64,
}

impl TradeTick {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume: 0.0,
            timestamp,
        }
    }

    pub fn traded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Point-in-time quote for a symbol. Every field is zero when the
/// upstream did not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub current: f64,
    pub change: f64,
    pub percent_change: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub prev_close: f64,
}

/// Instrument returned by a symbol search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InstrumentMatch {
    pub symbol: String,
    pub exchange: String,
    pub name: String,
    #[serde(rename = "type")]
    pub instrument_type: String,
    pub country: String,
    pub currency: String,
}

/// Search results together with the provider's quota counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<InstrumentMatch>,
    pub remaining_calls: u32,
    pub daily_limit: u32,
}
