// =============================================================================
// Terminal rendering for the `info` and snapshot commands
// =============================================================================
//
// Pure string builders; `main` decides where the text goes.
// =============================================================================

use std::fmt::Write as _;
use std::path::Path;

use chrono::Local;

use crate::market_data::{BookTicker, DailyStatistics};
use crate::snapshot::SnapshotDocument;

const RULE_WIDTH: usize = 80;

/// Data shown by the `info` command.
#[derive(Debug, Clone)]
pub struct InfoView {
    pub stats: DailyStatistics,
    pub book: BookTicker,
    /// Exchange clock minus local clock, when the server time was available.
    pub clock_offset_ms: Option<i64>,
}

/// Format `value` with `decimals` places and comma thousands separators.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // No "-0.00".
    let rounds_to_zero = formatted.chars().all(|c| c == '0' || c == '.');
    let sign = if value.is_sign_negative() && !rounds_to_zero { "-" } else { "" };

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Like [`group_thousands`] but always carries a sign.
fn signed(value: f64, decimals: usize) -> String {
    let body = group_thousands(value, decimals);
    if body.starts_with('-') {
        body
    } else {
        format!("+{body}")
    }
}

/// `part / whole` as a percentage, 0 for an empty whole.
fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn header(symbol: &str, mode: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\n  MARKET SNAPSHOT - {symbol}\n{rule}\n\n  Started: {}\n  Mode: {mode}\n\n{}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        "-".repeat(RULE_WIDTH)
    )
}

pub fn footer() -> String {
    format!(
        "{}\n  Completed: {}\n{}\n",
        "-".repeat(RULE_WIDTH),
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(RULE_WIDTH)
    )
}

/// Body of the `info` command.
pub fn render_info(view: &InfoView) -> String {
    let s = &view.stats;
    let b = &view.book;
    let mut out = String::new();

    let _ = writeln!(out, "  Symbol: {}", s.symbol);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Price: ${}", group_thousands(s.last_price, 2));
    let _ = writeln!(
        out,
        "  24h Change: {} ({}%)",
        signed(s.price_change, 2),
        signed(s.price_change_percent, 2)
    );
    let _ = writeln!(out, "  24h High: ${}", group_thousands(s.high_price, 2));
    let _ = writeln!(out, "  24h Low: ${}", group_thousands(s.low_price, 2));
    let _ = writeln!(out, "  24h Volume: {}", group_thousands(s.volume, 2));
    let _ = writeln!(out, "  24h Trades: {}", group_thousands(s.trade_count as f64, 0));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  Best Bid: ${} ({})",
        group_thousands(b.bid_price, 2),
        group_thousands(b.bid_qty, 4)
    );
    let _ = writeln!(
        out,
        "  Best Ask: ${} ({})",
        group_thousands(b.ask_price, 2),
        group_thousands(b.ask_qty, 4)
    );

    let spread = b.ask_price - b.bid_price;
    let spread_pct = if b.bid_price > 0.0 {
        spread / b.bid_price * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "  Spread: ${} ({:.4}%)",
        group_thousands(spread, 4),
        spread_pct
    );

    if let Some(offset) = view.clock_offset_ms {
        let _ = writeln!(out, "  Server clock offset: {offset:+} ms");
    }
    out
}

/// Body of the snapshot command.
pub fn render_snapshot(doc: &SnapshotDocument, path: &Path) -> String {
    let s = &doc.summary;
    let d = &doc.depth_analysis;
    let t = &doc.trade_analysis;
    let sp = &doc.spread;
    let base_asset = doc.symbol.get(..doc.symbol.len().saturating_sub(4)).unwrap_or("");
    let mut out = String::new();

    let _ = writeln!(out, "  Symbol: {}", doc.symbol);
    let _ = writeln!(out, "  Price: ${}", group_thousands(s.price, 2));
    let _ = writeln!(out, "  5m Avg Price: ${}", group_thousands(s.avg_price_5m, 2));
    let _ = writeln!(
        out,
        "  24h Change: {} ({}%)",
        signed(s.price_change_24h, 2),
        signed(s.price_change_percent_24h, 2)
    );
    let _ = writeln!(
        out,
        "  24h Range: ${} - ${}",
        group_thousands(s.low_24h, 2),
        group_thousands(s.high_24h, 2)
    );
    let _ = writeln!(out, "  24h Volume: {} {base_asset}", group_thousands(s.volume_24h, 2));
    let _ = writeln!(out, "  24h Quote Volume: ${}", group_thousands(s.quote_volume_24h, 2));
    let _ = writeln!(out, "  24h Trades: {}", group_thousands(s.trade_count_24h as f64, 0));
    let _ = writeln!(out);

    let _ = writeln!(out, "  Order Book Depth (top 20 levels):");
    let _ = writeln!(out, "    Total Bid Depth: {}", group_thousands(d.total_bid_depth, 4));
    let _ = writeln!(out, "    Total Ask Depth: {}", group_thousands(d.total_ask_depth, 4));
    let _ = writeln!(out, "    Bid/Ask Ratio: {:.2}", d.bid_ask_ratio);
    let _ = writeln!(out);

    let _ = writeln!(out, "  Recent Trade Analysis (last {}):", t.total_trades);
    let _ = writeln!(
        out,
        "    Buy Trades: {} ({:.1}%)",
        t.buy_trades,
        share(t.buy_trades, t.total_trades)
    );
    let _ = writeln!(
        out,
        "    Sell Trades: {} ({:.1}%)",
        t.sell_trades,
        share(t.sell_trades, t.total_trades)
    );
    let _ = writeln!(out, "    Buy/Sell Ratio: {:.2}", t.buy_sell_ratio);
    let _ = writeln!(out, "    Avg Trade Size: {:.4}", t.avg_trade_size);
    let _ = writeln!(out);

    let _ = writeln!(out, "  Spread: ${:.4} ({:.4}%)", sp.absolute, sp.percent);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Snapshot saved to: {}", path.display());
    out
}
