// =============================================================================
// Snapshot Document — the persisted, point-in-time aggregate
// =============================================================================
//
// One record per section of the stored JSON. Field names are the on-disk
// names; renaming a field here changes the file format.
// =============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::market_data::{BookTicker, Candle, PriceLevel};

/// Complete snapshot for one symbol. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotDocument {
    /// Local time at which the document was assembled.
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub summary: Summary,
    pub book_ticker: BookTicker,
    pub spread: Spread,
    pub depth_analysis: DepthAnalysis,
    pub trade_analysis: TradeAnalysis,
    pub klines: KlineTails,
}

/// Price and 24h statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub price: f64,
    pub avg_price_5m: f64,
    pub price_change_24h: f64,
    pub price_change_percent_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub quote_volume_24h: f64,
    pub trade_count_24h: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spread {
    pub absolute: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthAnalysis {
    pub total_bid_depth: f64,
    pub total_ask_depth: f64,
    pub bid_ask_ratio: f64,
    /// At most five levels, best first.
    pub top_bids: Vec<PriceLevel>,
    /// At most five levels, best first.
    pub top_asks: Vec<PriceLevel>,
}

/// Counts use the maker-is-buyer convention: a trade whose maker was the
/// buyer is a sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAnalysis {
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub buy_sell_ratio: f64,
    pub avg_trade_size: f64,
}

/// Most recent candles per interval, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineTails {
    #[serde(rename = "1h")]
    pub one_hour: Vec<Candle>,
    #[serde(rename = "4h")]
    pub four_hours: Vec<Candle>,
    #[serde(rename = "1d")]
    pub one_day: Vec<Candle>,
}
