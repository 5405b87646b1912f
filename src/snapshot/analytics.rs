// =============================================================================
// Snapshot Analytics — derived metrics over fetched market data
// =============================================================================
//
// All ratios are defined as 0.0 when their denominator is zero, and all
// aggregates over empty inputs are 0.0, so no derivation can fault.
// =============================================================================

use crate::market_data::{Candle, DepthSnapshot, RecentTrade};

use super::document::{DepthAnalysis, Spread, TradeAnalysis};

/// Levels kept per side in the depth analysis.
pub const TOP_LEVELS: usize = 5;

/// `numerator / denominator`, or 0.0 when the denominator is not positive.
fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Split trades into buyer- and seller-initiated counts.
///
/// `is_buyer_maker == true` means the taker sold into a resting bid, so the
/// trade counts as a sell.
pub fn analyze_trades(trades: &[RecentTrade]) -> TradeAnalysis {
    let sell_trades = trades.iter().filter(|t| t.is_buyer_maker).count();
    let buy_trades = trades.len() - sell_trades;

    let avg_trade_size = if trades.is_empty() {
        0.0
    } else {
        trades.iter().map(|t| t.qty).sum::<f64>() / trades.len() as f64
    };

    TradeAnalysis {
        total_trades: trades.len(),
        buy_trades,
        sell_trades,
        buy_sell_ratio: ratio_or_zero(buy_trades as f64, sell_trades as f64),
        avg_trade_size,
    }
}

/// Total resting quantity per side, their ratio, and the top levels.
pub fn analyze_depth(depth: &DepthSnapshot) -> DepthAnalysis {
    let total_bid_depth: f64 = depth.bids.iter().map(|l| l.quantity).sum();
    let total_ask_depth: f64 = depth.asks.iter().map(|l| l.quantity).sum();

    DepthAnalysis {
        total_bid_depth,
        total_ask_depth,
        bid_ask_ratio: ratio_or_zero(total_bid_depth, total_ask_depth),
        top_bids: depth.bids.iter().take(TOP_LEVELS).copied().collect(),
        top_asks: depth.asks.iter().take(TOP_LEVELS).copied().collect(),
    }
}

/// Best ask minus best bid, absolute and as a percentage of the bid.
pub fn compute_spread(depth: &DepthSnapshot) -> Spread {
    let (Some(bid), Some(ask)) = (depth.best_bid(), depth.best_ask()) else {
        return Spread::default();
    };

    let absolute = ask.price - bid.price;
    Spread {
        absolute,
        percent: ratio_or_zero(absolute, bid.price) * 100.0,
    }
}

/// The last `keep` candles of `series`, still oldest first.
pub fn tail(series: &[Candle], keep: usize) -> Vec<Candle> {
    let start = series.len().saturating_sub(keep);
    series[start..].to_vec()
}
