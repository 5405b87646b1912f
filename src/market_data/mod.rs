pub mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use types::{
    BookTicker, Candle, DailyStatistics, DepthSnapshot, KlineInterval, PriceLevel, QuoteSnapshot,
    RecentTrade, TickerPrice,
};

/// Typed, already-parsed accessors over a public market-data service.
///
/// Every accessor either returns a fully populated record or fails; the
/// snapshot assembler decides what a failure means for the caller.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Connectivity probe. Never fails, only reports.
    async fn ping(&self) -> bool;

    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice>;

    async fn ticker_24h(&self, symbol: &str) -> Result<DailyStatistics>;

    /// Order book with at most `limit` levels per side.
    async fn order_book(&self, symbol: &str, limit: u32) -> Result<DepthSnapshot>;

    /// The `limit` most recent trades, oldest first.
    async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<RecentTrade>>;

    /// Average price over the exchange's 5-minute window.
    async fn avg_price(&self, symbol: &str) -> Result<f64>;

    async fn book_ticker(&self, symbol: &str) -> Result<BookTicker>;

    /// The `limit` most recent candles for `interval`, oldest first.
    async fn klines(&self, symbol: &str, interval: KlineInterval, limit: u32)
        -> Result<Vec<Candle>>;
}
