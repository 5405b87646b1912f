// =============================================================================
// Binance REST API Client — public market-data endpoints
// =============================================================================
//
// Only unauthenticated `/api/v3` endpoints are used, so there is no API key,
// no signing and no order placement. Numeric fields arrive as JSON strings
// and are parsed into `f64`; any missing or unparsable field fails the call.
//
// The underlying `reqwest::Client` is acquired once per command through
// [`session`] and released when the session body finishes, whatever its
// outcome.
// =============================================================================

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::rate_limit::WeightTracker;
use crate::config::SnapshotConfig;
use crate::market_data::{
    BookTicker, Candle, DailyStatistics, DepthSnapshot, KlineInterval, MarketDataSource,
    PriceLevel, RecentTrade, TickerPrice,
};

/// Binance public REST API client.
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
    weight: WeightTracker,
}

/// Run `body` with a freshly built client and close it afterwards.
///
/// The client is released on both the success and the failure path of
/// `body`; the body's own result is passed through untouched.
pub async fn session<T, F, Fut>(config: &SnapshotConfig, body: F) -> Result<T>
where
    F: FnOnce(Arc<BinanceClient>) -> Fut,
    Fut: Future<Output = T>,
{
    let client = Arc::new(BinanceClient::new(config)?);
    let outcome = body(Arc::clone(&client)).await;
    client.close();
    Ok(outcome)
}

impl BinanceClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Build a client for `config.base_url` with the configured per-request
    /// timeout.
    pub fn new(config: &SnapshotConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build reqwest client")?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!(base_url = %base_url, timeout_secs = config.request_timeout_secs, "BinanceClient initialised");

        Ok(Self {
            base_url,
            client,
            weight: WeightTracker::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// End of the session: report usage. Idle connections are dropped with
    /// the last handle.
    pub fn close(&self) {
        info!(
            base_url = %self.base_url,
            requests = self.weight.requests(),
            used_weight_1m = self.weight.used_weight(),
            "Binance session closed"
        );
    }

    // -------------------------------------------------------------------------
    // General endpoints
    // -------------------------------------------------------------------------

    /// GET /api/v3/time — server time in milliseconds.
    #[instrument(skip(self), name = "binance::server_time")]
    pub async fn server_time(&self) -> Result<i64> {
        let body = self.get_json("/api/v3/time", &[]).await?;
        field_i64(&body, "serverTime")
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Issue a GET and decode the body as JSON, failing on non-2xx statuses.
    async fn get_json(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {endpoint} request failed"))?;

        self.weight.record(resp.headers());

        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("failed to read {endpoint} response body"))?;

        if !status.is_success() {
            anyhow::bail!("Binance GET {endpoint} returned {status}: {text}");
        }

        serde_json::from_str(&text).with_context(|| format!("failed to parse {endpoint} response"))
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    /// GET /api/v3/ping.
    async fn ping(&self) -> bool {
        match self.get_json("/api/v3/ping", &[]).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Binance ping failed");
                false
            }
        }
    }

    /// GET /api/v3/ticker/price.
    #[instrument(skip(self), name = "binance::ticker_price")]
    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice> {
        let body = self
            .get_json("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;

        Ok(TickerPrice {
            symbol: field_str(&body, "symbol")?,
            price: str_f64(&body["price"], "price")?,
        })
    }

    /// GET /api/v3/ticker/24hr.
    #[instrument(skip(self), name = "binance::ticker_24h")]
    async fn ticker_24h(&self, symbol: &str) -> Result<DailyStatistics> {
        let b = self
            .get_json("/api/v3/ticker/24hr", &[("symbol", symbol.to_string())])
            .await?;

        Ok(DailyStatistics {
            symbol: field_str(&b, "symbol")?,
            price_change: str_f64(&b["priceChange"], "priceChange")?,
            price_change_percent: str_f64(&b["priceChangePercent"], "priceChangePercent")?,
            weighted_avg_price: str_f64(&b["weightedAvgPrice"], "weightedAvgPrice")?,
            prev_close_price: str_f64(&b["prevClosePrice"], "prevClosePrice")?,
            last_price: str_f64(&b["lastPrice"], "lastPrice")?,
            bid_price: str_f64(&b["bidPrice"], "bidPrice")?,
            ask_price: str_f64(&b["askPrice"], "askPrice")?,
            open_price: str_f64(&b["openPrice"], "openPrice")?,
            high_price: str_f64(&b["highPrice"], "highPrice")?,
            low_price: str_f64(&b["lowPrice"], "lowPrice")?,
            volume: str_f64(&b["volume"], "volume")?,
            quote_volume: str_f64(&b["quoteVolume"], "quoteVolume")?,
            open_time: field_i64(&b, "openTime")?,
            close_time: field_i64(&b, "closeTime")?,
            trade_count: field_u64(&b, "count")?,
        })
    }

    /// GET /api/v3/depth.
    ///
    /// Expected shape:
    /// ```json
    /// { "lastUpdateId": 12345, "bids": [["100.0", "2.0"], ...], "asks": [...] }
    /// ```
    #[instrument(skip(self), name = "binance::order_book")]
    async fn order_book(&self, symbol: &str, limit: u32) -> Result<DepthSnapshot> {
        let body = self
            .get_json(
                "/api/v3/depth",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        let depth = DepthSnapshot {
            symbol: symbol.to_string(),
            bids: parse_levels(&body["bids"], "bids")?,
            asks: parse_levels(&body["asks"], "asks")?,
            last_update_id: field_u64(&body, "lastUpdateId")?,
        };

        if !depth.is_well_ordered() {
            anyhow::bail!("order book levels for {symbol} are out of price order");
        }

        debug!(
            symbol,
            bids = depth.bids.len(),
            asks = depth.asks.len(),
            last_update_id = depth.last_update_id,
            "order book fetched"
        );
        Ok(depth)
    }

    /// GET /api/v3/trades.
    #[instrument(skip(self), name = "binance::recent_trades")]
    async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<RecentTrade>> {
        let body = self
            .get_json(
                "/api/v3/trades",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        let raw = body.as_array().context("trades response is not an array")?;

        let trades = raw
            .iter()
            .map(|t| {
                Ok(RecentTrade {
                    id: field_u64(t, "id")?,
                    price: str_f64(&t["price"], "price")?,
                    qty: str_f64(&t["qty"], "qty")?,
                    quote_qty: str_f64(&t["quoteQty"], "quoteQty")?,
                    time: field_i64(t, "time")?,
                    is_buyer_maker: t["isBuyerMaker"]
                        .as_bool()
                        .context("missing field isBuyerMaker")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(symbol, count = trades.len(), "recent trades fetched");
        Ok(trades)
    }

    /// GET /api/v3/avgPrice.
    #[instrument(skip(self), name = "binance::avg_price")]
    async fn avg_price(&self, symbol: &str) -> Result<f64> {
        let body = self
            .get_json("/api/v3/avgPrice", &[("symbol", symbol.to_string())])
            .await?;
        str_f64(&body["price"], "price")
    }

    /// GET /api/v3/ticker/bookTicker.
    #[instrument(skip(self), name = "binance::book_ticker")]
    async fn book_ticker(&self, symbol: &str) -> Result<BookTicker> {
        let b = self
            .get_json("/api/v3/ticker/bookTicker", &[("symbol", symbol.to_string())])
            .await?;

        Ok(BookTicker {
            symbol: field_str(&b, "symbol")?,
            bid_price: str_f64(&b["bidPrice"], "bidPrice")?,
            bid_qty: str_f64(&b["bidQty"], "bidQty")?,
            ask_price: str_f64(&b["askPrice"], "askPrice")?,
            ask_qty: str_f64(&b["askQty"], "askQty")?,
        })
    }

    /// GET /api/v3/klines.
    ///
    /// Array indices:
    ///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
    ///   [6] closeTime, [7] quoteAssetVolume, [8] numberOfTrades,
    ///   [9] takerBuyBaseVolume, [10] takerBuyQuoteVolume
    #[instrument(skip(self), name = "binance::klines")]
    async fn klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let body = self
            .get_json(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let raw = body.as_array().context("klines response is not an array")?;

        let mut candles = Vec::with_capacity(raw.len());
        for entry in raw {
            let arr = entry.as_array().context("kline entry is not an array")?;
            if arr.len() < 11 {
                anyhow::bail!("malformed kline entry with {} elements", arr.len());
            }

            candles.push(Candle {
                open_time: arr[0].as_i64().context("kline openTime is not an integer")?,
                open: str_f64(&arr[1], "open")?,
                high: str_f64(&arr[2], "high")?,
                low: str_f64(&arr[3], "low")?,
                close: str_f64(&arr[4], "close")?,
                volume: str_f64(&arr[5], "volume")?,
                close_time: arr[6].as_i64().context("kline closeTime is not an integer")?,
                quote_volume: str_f64(&arr[7], "quoteAssetVolume")?,
                trade_count: arr[8].as_u64().context("kline numberOfTrades is not an integer")?,
                taker_buy_volume: str_f64(&arr[9], "takerBuyBaseVolume")?,
                taker_buy_quote_volume: str_f64(&arr[10], "takerBuyQuoteVolume")?,
            });
        }

        debug!(symbol, interval = %interval, count = candles.len(), "klines fetched");
        Ok(candles)
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("weight", &self.weight)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Field parsing
// -----------------------------------------------------------------------------

/// Parse a JSON value that may be either a string or a number into a finite
/// `f64`. `"NaN"` and `"inf"` parse in Rust but are malformed here.
fn str_f64(val: &Value, name: &str) -> Result<f64> {
    match val {
        Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}"))
            .and_then(|v| {
                Some(v)
                    .filter(|v| v.is_finite())
                    .with_context(|| format!("{name} is not a finite number: {s}"))
            }),
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .with_context(|| format!("field {name} is not a finite f64")),
        Value::Null => anyhow::bail!("missing field {name}"),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

fn field_str(obj: &Value, name: &str) -> Result<String> {
    obj[name]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("missing field {name}"))
}

fn field_i64(obj: &Value, name: &str) -> Result<i64> {
    obj[name]
        .as_i64()
        .with_context(|| format!("missing integer field {name}"))
}

fn field_u64(obj: &Value, name: &str) -> Result<u64> {
    obj[name]
        .as_u64()
        .with_context(|| format!("missing integer field {name}"))
}

/// Parse `[["price", "qty"], ...]` into levels.
fn parse_levels(val: &Value, side: &str) -> Result<Vec<PriceLevel>> {
    let raw = val
        .as_array()
        .with_context(|| format!("missing field {side}"))?;

    raw.iter()
        .map(|level| {
            let pair = level
                .as_array()
                .filter(|a| a.len() >= 2)
                .with_context(|| format!("malformed {side} level: {level}"))?;
            Ok(PriceLevel::new(
                str_f64(&pair[0], "price")?,
                str_f64(&pair[1], "quantity")?,
            ))
        })
        .collect()
}
