// =============================================================================
// Market data records — parsed responses from the public REST endpoints
// =============================================================================
//
// Every record is fully populated when returned by a `MarketDataSource`.
// Field names follow the persisted snapshot schema where the record is
// embedded in it directly (`BookTicker`, `Candle`).
// =============================================================================

use serde::{Deserialize, Serialize};

/// Current price for a symbol (`/api/v3/ticker/price`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: f64,
}

/// 24-hour rolling window statistics (`/api/v3/ticker/24hr`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistics {
    pub symbol: String,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub weighted_avg_price: f64,
    pub prev_close_price: f64,
    pub last_price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub open_time: i64,
    pub close_time: i64,
    pub trade_count: u64,
}

/// Best bid/ask price and quantity (`/api/v3/ticker/bookTicker`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookTicker {
    pub symbol: String,
    pub bid_price: f64,
    pub bid_qty: f64,
    pub ask_price: f64,
    pub ask_qty: f64,
}

/// Last price, 5-minute average and top of book, taken together.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub last_price: f64,
    pub avg_price_5m: f64,
    pub book: BookTicker,
}

/// A single `(price, quantity)` order-book level.
///
/// Serialised as a two-element array `[price, qty]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

impl PriceLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

impl From<[f64; 2]> for PriceLevel {
    fn from([price, quantity]: [f64; 2]) -> Self {
        Self { price, quantity }
    }
}

impl From<PriceLevel> for [f64; 2] {
    fn from(level: PriceLevel) -> Self {
        [level.price, level.quantity]
    }
}

/// Order-book depth (`/api/v3/depth`), best price first on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthSnapshot {
    pub symbol: String,
    /// Strictly decreasing prices.
    pub bids: Vec<PriceLevel>,
    /// Strictly increasing prices.
    pub asks: Vec<PriceLevel>,
    pub last_update_id: u64,
}

impl DepthSnapshot {
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Check the ordering invariant on both sides of the book.
    pub fn is_well_ordered(&self) -> bool {
        self.bids.windows(2).all(|w| w[0].price > w[1].price)
            && self.asks.windows(2).all(|w| w[0].price < w[1].price)
    }
}

/// One entry from `/api/v3/trades`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentTrade {
    pub id: u64,
    pub price: f64,
    pub qty: f64,
    pub quote_qty: f64,
    pub time: i64,
    /// `true` when the resting (maker) order was the buy side.
    pub is_buyer_maker: bool,
}

/// A single OHLCV candle from `/api/v3/klines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub trade_count: u64,
    pub taker_buy_volume: f64,
    pub taker_buy_quote_volume: f64,
}

/// Candle intervals included in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KlineInterval {
    OneHour,
    FourHours,
    OneDay,
}

impl KlineInterval {
    pub const ALL: [KlineInterval; 3] = [Self::OneHour, Self::FourHours, Self::OneDay];

    /// Binance interval token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        }
    }

    /// How many candles to request: 24 hours, 7 days and 30 days of history.
    pub fn fetch_limit(self) -> u32 {
        match self {
            Self::OneHour => 24,
            Self::FourHours => 42,
            Self::OneDay => 30,
        }
    }

    /// How many of the most recent candles end up in the snapshot.
    pub fn retained(self) -> usize {
        match self {
            Self::OneHour => 6,
            Self::FourHours => 6,
            Self::OneDay => 7,
        }
    }
}

impl std::fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
