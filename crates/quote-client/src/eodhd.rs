use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use market_core::{InstrumentMatch, MarketError, SymbolSearch};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

const BASE_URL: &str = "https://eodhd.com/api";

/// Per-UTC-day call budget. The free EODHD plan allows 20 calls a day.
#[derive(Debug)]
struct CallBudget {
    daily_limit: u32,
    state: Mutex<BudgetState>,
}

#[derive(Debug)]
struct BudgetState {
    day: NaiveDate,
    used: u32,
}

impl CallBudget {
    fn new(daily_limit: u32) -> Self {
        Self {
            daily_limit,
            state: Mutex::new(BudgetState {
                day: Utc::now().date_naive(),
                used: 0,
            }),
        }
    }

    /// Consume one call for `day`, resetting the counter when the day rolls over.
    fn try_consume(&self, day: NaiveDate) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.day != day {
            state.day = day;
            state.used = 0;
        }
        if state.used >= self.daily_limit {
            return false;
        }
        state.used += 1;
        true
    }

    fn remaining(&self, day: NaiveDate) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.day != day {
            return self.daily_limit;
        }
        self.daily_limit.saturating_sub(state.used)
    }
}

/// EODHD instrument search client
pub struct EodhdClient {
    api_key: String,
    base_url: String,
    client: Client,
    budget: CallBudget,
}

impl EodhdClient {
    pub fn new(api_key: String, daily_limit: u32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            budget: CallBudget::new(daily_limit),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, MarketError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| MarketError::ConfigError(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| MarketError::ConfigError(format!("Invalid EODHD base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("search")
            .push(query);
        Ok(url)
    }

    /// Search stocks, ETFs and funds by ticker or name
    pub async fn search_stocks(&self, query: &str) -> Result<Vec<InstrumentMatch>, MarketError> {
        if !self.budget.try_consume(Utc::now().date_naive()) {
            return Err(MarketError::RateLimited(format!(
                "EODHD daily limit of {} calls reached",
                self.budget.daily_limit
            )));
        }

        let url = self.search_url(query)?;
        let response = self
            .client
            .get(url)
            .query(&[("api_token", self.api_key.as_str()), ("fmt", "json")])
            .send()
            .await
            .map_err(|e| MarketError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketError::ApiError(format!(
                "Search HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MarketError::ApiError(e.to_string()))?;

        Ok(map_search_results(body))
    }
}

#[async_trait]
impl SymbolSearch for EodhdClient {
    async fn search(&self, query: &str) -> Result<Vec<InstrumentMatch>, MarketError> {
        self.search_stocks(query).await
    }

    fn remaining_calls(&self) -> u32 {
        self.budget.remaining(Utc::now().date_naive())
    }

    fn daily_limit(&self) -> u32 {
        self.budget.daily_limit
    }
}

// Search wire type
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchEntry {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Exchange")]
    exchange: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    r#type: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Currency")]
    currency: String,
}

/// Anything other than an array of entries maps to no results.
fn map_search_results(body: serde_json::Value) -> Vec<InstrumentMatch> {
    let serde_json::Value::Array(entries) = body else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<SearchEntry>(entry).ok())
        .map(|e| InstrumentMatch {
            symbol: e.code,
            exchange: e.exchange,
            name: e.name,
            instrument_type: e.r#type,
            country: e.country,
            currency: e.currency,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_budget_counts_down_and_resets_next_day() {
        let budget = CallBudget::new(2);
        {
            let mut state = budget.state.lock().unwrap();
            state.day = day(1);
        }

        assert_eq!(budget.remaining(day(1)), 2);
        assert!(budget.try_consume(day(1)));
        assert!(budget.try_consume(day(1)));
        assert!(!budget.try_consume(day(1)));
        assert_eq!(budget.remaining(day(1)), 0);

        assert_eq!(budget.remaining(day(2)), 2);
        assert!(budget.try_consume(day(2)));
        assert_eq!(budget.remaining(day(2)), 1);
    }

    #[test]
    fn test_map_search_results() {
        let body = serde_json::json!([
            {"Code": "AAPL", "Exchange": "US", "Name": "Apple Inc", "Type": "Common Stock",
             "Country": "USA", "Currency": "USD", "ISIN": "US0378331005", "previousClose": 227.1},
            {"Code": "AAPL", "Exchange": "MX", "Name": "Apple Inc", "Type": "Common Stock",
             "Country": "Mexico", "Currency": "MXN"}
        ]);

        let results = map_search_results(body);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[0].exchange, "US");
        assert_eq!(results[0].instrument_type, "Common Stock");
        assert_eq!(results[1].currency, "MXN");
    }

    #[test]
    fn test_map_search_results_non_array_is_empty() {
        assert!(map_search_results(serde_json::json!({"error": "bad token"})).is_empty());
        assert!(map_search_results(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_search_url_escapes_query() {
        let client = EodhdClient::new("demo".to_string(), 20);
        let url = client.search_url("berkshire hathaway/b").unwrap();
        assert_eq!(url.as_str(), "https://eodhd.com/api/search/berkshire%20hathaway%2Fb");
    }

    #[test]
    fn test_exhausted_budget_fails_without_network() {
        let client = EodhdClient::new("demo".to_string(), 0);
        let result = tokio_test::block_on(client.search("apple"));

        assert!(matches!(result, Err(MarketError::RateLimited(_))));
        assert_eq!(client.remaining_calls(), 0);
        assert_eq!(client.daily_limit(), 0);
    }
}
