use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Fundamentals row for the screener. Market cap is in millions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerStock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: f64,
    pub sector: String,
    #[serde(default)]
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerFilter {
    #[serde(default)]
    pub search: String,
    /// Empty means every sector
    #[serde(default)]
    pub sectors: HashSet<String>,
    #[serde(default = "default_min_cap")]
    pub market_cap_min: f64,
    #[serde(default = "default_max_cap")]
    pub market_cap_max: f64,
}

fn default_min_cap() -> f64 {
    0.0
}

fn default_max_cap() -> f64 {
    500_000.0
}

impl Default for ScreenerFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            sectors: HashSet::new(),
            market_cap_min: default_min_cap(),
            market_cap_max: default_max_cap(),
        }
    }
}

impl ScreenerFilter {
    pub fn matches(&self, stock: &ScreenerStock) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || stock.symbol.to_lowercase().contains(&needle)
            || stock.name.to_lowercase().contains(&needle);
        let matches_sector = self.sectors.is_empty() || self.sectors.contains(&stock.sector);
        let matches_cap = stock.market_cap >= self.market_cap_min && stock.market_cap <= self.market_cap_max;

        matches_search && matches_sector && matches_cap
    }

    pub fn apply(&self, stocks: &[ScreenerStock]) -> Vec<ScreenerStock> {
        stocks.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}

/// Render a market cap given in millions: `1.2T`, `248.4B`, `950M`.
pub fn format_market_cap(millions: f64) -> String {
    if millions >= 1_000_000.0 {
        format!("{:.1}T", millions / 1_000_000.0)
    } else if millions >= 1_000.0 {
        format!("{:.1}B", millions / 1_000.0)
    } else {
        format!("{}M", millions)
    }
}
