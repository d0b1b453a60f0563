//! Live quote table: the per-symbol trade fold, board filtering,
//! pagination and the fundamentals screener.

mod board;
mod pagination;
mod screener;

pub use board::{BoardFilter, QuoteBoard, StockRow, DEFAULT_SYMBOLS};
pub use pagination::{PageEntry, Paginator, PAGE_SIZE};
pub use screener::{format_market_cap, ScreenerFilter, ScreenerStock};
