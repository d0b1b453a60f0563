use async_trait::async_trait;
use crate::{InstrumentMatch, MarketError, QuoteSnapshot};

/// Source of point-in-time quotes (used to seed live tables)
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketError>;
}

/// Free-text instrument search backed by an upstream provider
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<InstrumentMatch>, MarketError>;

    /// Calls left in the provider's current quota window
    fn remaining_calls(&self) -> u32;

    fn daily_limit(&self) -> u32;
}
