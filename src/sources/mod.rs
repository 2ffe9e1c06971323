// =============================================================================
// External Data Sources
// =============================================================================
//
// Thin fetch clients for the three upstream interfaces the screener consumes:
// - the IPO calendar (live with an API key, demo list otherwise),
// - daily OHLCV price history per ticker,
// - a loosely-keyed stock info/profile map.
//
// Fetch failures surface as `anyhow` errors. They are recoverable: the
// screener boundary records each one and substitutes an empty result
// (prices, info) or the static demo list (calendar), never an abort.

pub mod cache;
pub mod ipo_calendar;
pub mod price_history;
pub mod stock_info;

pub use cache::{FetchCache, PriceKey};
pub use ipo_calendar::IpoCalendarClient;
pub use price_history::PriceHistoryClient;
pub use stock_info::StockInfoClient;
