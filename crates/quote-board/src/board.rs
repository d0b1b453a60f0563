use market_core::{QuoteSnapshot, TradeTick};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Symbols tracked when none are configured
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "GOOGL", "AMZN", "MSFT", "TSLA", "NFLX", "META", "NVDA", "AMD", "INTC", "BABA", "CRM",
    "UBER", "DIS", "PYPL", "ADBE", "ORCL", "PEP", "KO", "NKE", "BA", "WMT", "COST", "T", "VZ",
    "QCOM", "CSCO", "JNJ", "PFE", "XOM", "CVX",
];

/// One line of the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockRow {
    pub symbol: String,
    #[serde(flatten)]
    pub quote: QuoteSnapshot,
}

impl StockRow {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quote: QuoteSnapshot::default(),
        }
    }

    /// Fold one trade price into the row. Zero fields count as "not seen yet".
    fn apply_price(&mut self, price: f64) {
        let q = &mut self.quote;

        let prev_close = if q.prev_close != 0.0 { q.prev_close } else { price };
        let low = if q.low != 0.0 { q.low } else { f64::INFINITY };

        q.change = price - prev_close;
        q.percent_change = if prev_close != 0.0 {
            q.change / prev_close * 100.0
        } else {
            0.0
        };
        q.high = q.high.max(price);
        q.low = low.min(price);
        if q.open == 0.0 {
            q.open = price;
        }
        q.prev_close = prev_close;
        q.current = price;
    }
}

/// Rows for the tracked symbols, in tracking order.
#[derive(Debug, Clone, Default)]
pub struct QuoteBoard {
    rows: Vec<StockRow>,
    index: HashMap<String, usize>,
}

impl QuoteBoard {
    /// Board with a zero row for every symbol. Duplicates are dropped.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Self {
        let mut board = Self::default();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_ascii_uppercase();
            if symbol.is_empty() || board.index.contains_key(&symbol) {
                continue;
            }
            board.index.insert(symbol.clone(), board.rows.len());
            board.rows.push(StockRow::empty(symbol));
        }
        board
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SYMBOLS)
    }

    /// Replace a tracked symbol's row with a fetched snapshot.
    /// Returns false for untracked symbols.
    pub fn seed(&mut self, symbol: &str, quote: QuoteSnapshot) -> bool {
        match self.row_mut(symbol) {
            Some(row) => {
                row.quote = quote;
                true
            }
            None => false,
        }
    }

    /// Fold a trade into its row and return the updated row.
    /// Untracked symbols and non-positive prices are ignored.
    pub fn apply_trade(&mut self, tick: &TradeTick) -> Option<StockRow> {
        if !(tick.price.is_finite() && tick.price > 0.0) {
            return None;
        }
        let row = self.row_mut(&tick.symbol)?;
        row.apply_price(tick.price);
        Some(row.clone())
    }

    pub fn get(&self, symbol: &str) -> Option<&StockRow> {
        self.index
            .get(&symbol.trim().to_ascii_uppercase())
            .map(|&i| &self.rows[i])
    }

    pub fn is_tracked(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn rows(&self) -> &[StockRow] {
        &self.rows
    }

    pub fn symbols(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, symbol: &str) -> Option<&mut StockRow> {
        let i = *self.index.get(&symbol.trim().to_ascii_uppercase())?;
        self.rows.get_mut(i)
    }
}

/// Search and direction filter over board rows
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BoardFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub gainers_only: bool,
    #[serde(default)]
    pub losers_only: bool,
}

impl BoardFilter {
    pub fn matches(&self, row: &StockRow) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() && !row.symbol.to_lowercase().contains(&needle) {
            return false;
        }
        if self.gainers_only && row.quote.change <= 0.0 {
            return false;
        }
        if self.losers_only && row.quote.change >= 0.0 {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [StockRow]) -> Vec<&'a StockRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}
