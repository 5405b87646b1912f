// =============================================================================
// Snapshot Assembler — fetch, derive, assemble, persist
// =============================================================================
//
// Pipeline for one symbol:
//   1. Fetch price, 24h stats, depth(20), trades(100), 5m average, book
//      ticker, then 1h×24, 4h×42 and 1d×30 candles, one after another.
//   2. Derive trade, depth and spread analytics; trim candle series.
//   3. Stamp the document with the assembly time and persist it.
//
// Every fetch shares the same timeout. The first failed or timed-out fetch
// aborts the whole run before anything reaches the store.
// =============================================================================

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, instrument};

use super::analytics::{analyze_depth, analyze_trades, compute_spread, tail};
use super::document::{KlineTails, SnapshotDocument, Summary};
use super::store::SnapshotStore;
use crate::config::SnapshotConfig;
use crate::error::{FetchOperation, SnapshotError};
use crate::market_data::{
    Candle, DailyStatistics, DepthSnapshot, KlineInterval, MarketDataSource, QuoteSnapshot,
    RecentTrade,
};

/// Order-book levels requested per side.
pub const DEPTH_LEVELS: u32 = 20;
/// Recent trades requested.
pub const TRADE_SAMPLE: u32 = 100;

/// Everything fetched for one symbol, owned only for the duration of one
/// assembly.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub quote: QuoteSnapshot,
    pub daily: DailyStatistics,
    pub depth: DepthSnapshot,
    pub trades: Vec<RecentTrade>,
    pub klines_1h: Vec<Candle>,
    pub klines_4h: Vec<Candle>,
    pub klines_1d: Vec<Candle>,
}

/// A document together with where it was written.
#[derive(Debug, Clone)]
pub struct PersistedSnapshot {
    pub document: SnapshotDocument,
    pub path: PathBuf,
}

/// Builds and persists snapshot documents.
#[derive(Debug, Clone)]
pub struct SnapshotAssembler {
    fetch_timeout: Duration,
    output_dir: PathBuf,
}

impl SnapshotAssembler {
    pub fn new(fetch_timeout: Duration, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetch_timeout,
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(config.request_timeout(), config.snapshot_dir.clone())
    }

    /// Fetch everything for `symbol`, build the document and persist it under
    /// `output_dir` (or the configured default).
    ///
    /// Nothing is written unless every fetch succeeded.
    #[instrument(skip(self, source, output_dir), name = "snapshot::create")]
    pub async fn create_snapshot(
        &self,
        symbol: &str,
        source: &dyn MarketDataSource,
        output_dir: Option<&Path>,
    ) -> Result<PersistedSnapshot, SnapshotError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SnapshotError::InvalidSymbol);
        }

        info!(symbol, "creating market snapshot");

        let data = self.collect(symbol, source).await?;
        let document = build_document(symbol, &data, Local::now().naive_local());

        let dir = output_dir.unwrap_or(self.output_dir.as_path());
        let path = SnapshotStore::save(&document, dir, symbol)?;

        info!(
            symbol,
            path = %path.display(),
            buy_trades = document.trade_analysis.buy_trades,
            sell_trades = document.trade_analysis.sell_trades,
            "market snapshot created"
        );
        Ok(PersistedSnapshot { document, path })
    }

    /// Issue the fetches in order, stopping at the first failure.
    pub async fn collect(
        &self,
        symbol: &str,
        source: &dyn MarketDataSource,
    ) -> Result<MarketData, SnapshotError> {
        let ticker = self
            .fetch(FetchOperation::TickerPrice, source.ticker_price(symbol))
            .await?;
        let daily = self
            .fetch(FetchOperation::Ticker24h, source.ticker_24h(symbol))
            .await?;
        let depth = self
            .fetch(FetchOperation::OrderBook, source.order_book(symbol, DEPTH_LEVELS))
            .await?;
        let trades = self
            .fetch(FetchOperation::RecentTrades, source.recent_trades(symbol, TRADE_SAMPLE))
            .await?;
        let avg_price_5m = self
            .fetch(FetchOperation::AvgPrice, source.avg_price(symbol))
            .await?;
        let book = self
            .fetch(FetchOperation::BookTicker, source.book_ticker(symbol))
            .await?;

        let klines_1h = self.fetch_klines(symbol, source, KlineInterval::OneHour).await?;
        let klines_4h = self.fetch_klines(symbol, source, KlineInterval::FourHours).await?;
        let klines_1d = self.fetch_klines(symbol, source, KlineInterval::OneDay).await?;

        Ok(MarketData {
            quote: QuoteSnapshot {
                symbol: ticker.symbol,
                last_price: ticker.price,
                avg_price_5m,
                book,
            },
            daily,
            depth,
            trades,
            klines_1h,
            klines_4h,
            klines_1d,
        })
    }

    async fn fetch_klines(
        &self,
        symbol: &str,
        source: &dyn MarketDataSource,
        interval: KlineInterval,
    ) -> Result<Vec<Candle>, SnapshotError> {
        self.fetch(
            FetchOperation::Klines(interval),
            source.klines(symbol, interval, interval.fetch_limit()),
        )
        .await
    }

    /// Await one fetch under the shared timeout, tagging any failure with
    /// the operation that produced it.
    async fn fetch<T, F>(&self, operation: FetchOperation, fut: F) -> Result<T, SnapshotError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.fetch_timeout, fut).await {
            Ok(Ok(value)) => {
                debug!(%operation, "fetch complete");
                Ok(value)
            }
            Ok(Err(e)) => Err(SnapshotError::unavailable(operation, e)),
            Err(_) => Err(SnapshotError::unavailable(
                operation,
                anyhow::anyhow!("timed out after {:?}", self.fetch_timeout),
            )),
        }
    }
}

/// Derive analytics from `data` and assemble the document stamped `timestamp`.
pub fn build_document(symbol: &str, data: &MarketData, timestamp: NaiveDateTime) -> SnapshotDocument {
    SnapshotDocument {
        timestamp,
        symbol: symbol.to_string(),
        summary: Summary {
            price: data.quote.last_price,
            avg_price_5m: data.quote.avg_price_5m,
            price_change_24h: data.daily.price_change,
            price_change_percent_24h: data.daily.price_change_percent,
            high_24h: data.daily.high_price,
            low_24h: data.daily.low_price,
            volume_24h: data.daily.volume,
            quote_volume_24h: data.daily.quote_volume,
            trade_count_24h: data.daily.trade_count,
        },
        book_ticker: data.quote.book.clone(),
        spread: compute_spread(&data.depth),
        depth_analysis: analyze_depth(&data.depth),
        trade_analysis: analyze_trades(&data.trades),
        klines: KlineTails {
            one_hour: tail(&data.klines_1h, KlineInterval::OneHour.retained()),
            four_hours: tail(&data.klines_4h, KlineInterval::FourHours.retained()),
            one_day: tail(&data.klines_1d, KlineInterval::OneDay.retained()),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{BookTicker, PriceLevel, TickerPrice};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// In-memory source that records the order of calls and can be told to
    /// fail or stall on one of them.
    struct StubSource {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        stall_on: Option<&'static str>,
        trades: Vec<RecentTrade>,
    }

    impl StubSource {
        fn new() -> Self {
            let trades = (0..10)
                .map(|i| RecentTrade {
                    id: i,
                    price: 100.0,
                    qty: 0.5,
                    quote_qty: 50.0,
                    time: 1_700_000_000_000 + i as i64,
                    is_buyer_maker: i >= 7,
                })
                .collect();
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
                stall_on: None,
                trades,
            }
        }

        fn failing_on(call: &'static str) -> Self {
            Self {
                fail_on: Some(call),
                ..Self::new()
            }
        }

        fn stalling_on(call: &'static str) -> Self {
            Self {
                stall_on: Some(call),
                ..Self::new()
            }
        }

        async fn enter(&self, call: &str) -> anyhow::Result<()> {
            self.calls.lock().push(call.to_string());
            if self.stall_on == Some(call) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if self.fail_on == Some(call) {
                anyhow::bail!("connection reset during {call}");
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    fn candles(count: usize, interval_ms: i64) -> Vec<Candle> {
        (0..count as i64)
            .map(|i| Candle {
                open_time: i * interval_ms,
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.5 + i as f64,
                volume: 10.0,
                close_time: (i + 1) * interval_ms - 1,
                quote_volume: 1000.0,
                trade_count: 42,
                taker_buy_volume: 5.0,
                taker_buy_quote_volume: 500.0,
            })
            .collect()
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn ping(&self) -> bool {
            true
        }

        async fn ticker_price(&self, symbol: &str) -> anyhow::Result<TickerPrice> {
            self.enter("ticker_price").await?;
            Ok(TickerPrice {
                symbol: symbol.to_string(),
                price: 100.5,
            })
        }

        async fn ticker_24h(&self, symbol: &str) -> anyhow::Result<DailyStatistics> {
            self.enter("ticker_24h").await?;
            Ok(DailyStatistics {
                symbol: symbol.to_string(),
                price_change: 2.5,
                price_change_percent: 2.55,
                weighted_avg_price: 99.8,
                prev_close_price: 98.0,
                last_price: 100.5,
                bid_price: 100.0,
                ask_price: 101.0,
                open_price: 98.0,
                high_price: 102.0,
                low_price: 97.5,
                volume: 12_345.0,
                quote_volume: 1_234_567.0,
                open_time: 1_700_000_000_000,
                close_time: 1_700_086_399_999,
                trade_count: 9_876,
            })
        }

        async fn order_book(&self, symbol: &str, limit: u32) -> anyhow::Result<DepthSnapshot> {
            self.enter("order_book").await?;
            assert_eq!(limit, DEPTH_LEVELS);
            Ok(DepthSnapshot {
                symbol: symbol.to_string(),
                bids: vec![PriceLevel::new(100.0, 2.0), PriceLevel::new(99.0, 3.0)],
                asks: vec![PriceLevel::new(101.0, 1.0), PriceLevel::new(102.0, 4.0)],
                last_update_id: 77,
            })
        }

        async fn recent_trades(&self, _symbol: &str, limit: u32) -> anyhow::Result<Vec<RecentTrade>> {
            self.enter("recent_trades").await?;
            assert_eq!(limit, TRADE_SAMPLE);
            Ok(self.trades.clone())
        }

        async fn avg_price(&self, _symbol: &str) -> anyhow::Result<f64> {
            self.enter("avg_price").await?;
            Ok(100.25)
        }

        async fn book_ticker(&self, symbol: &str) -> anyhow::Result<BookTicker> {
            self.enter("book_ticker").await?;
            Ok(BookTicker {
                symbol: symbol.to_string(),
                bid_price: 100.0,
                bid_qty: 2.0,
                ask_price: 101.0,
                ask_qty: 1.0,
            })
        }

        async fn klines(
            &self,
            _symbol: &str,
            interval: KlineInterval,
            limit: u32,
        ) -> anyhow::Result<Vec<Candle>> {
            self.enter(&format!("klines_{interval}")).await?;
            let step = match interval {
                KlineInterval::OneHour => 3_600_000,
                KlineInterval::FourHours => 14_400_000,
                KlineInterval::OneDay => 86_400_000,
            };
            // Fewer daily candles than requested, as for a newly listed pair.
            let count = if interval == KlineInterval::OneDay { 4 } else { limit as usize };
            Ok(candles(count, step))
        }
    }

    fn assembler(timeout: Duration) -> SnapshotAssembler {
        SnapshotAssembler::new(timeout, "unused-default-dir")
    }

    #[tokio::test]
    async fn creates_and_persists_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new();

        let out = assembler(Duration::from_secs(5))
            .create_snapshot("ETHUSDT", &source, Some(dir.path()))
            .await
            .unwrap();

        assert_eq!(
            source.calls(),
            vec![
                "ticker_price",
                "ticker_24h",
                "order_book",
                "recent_trades",
                "avg_price",
                "book_ticker",
                "klines_1h",
                "klines_4h",
                "klines_1d",
            ]
        );

        let doc = &out.document;
        assert_eq!(doc.symbol, "ETHUSDT");
        assert_eq!(doc.summary.price, 100.5);
        assert_eq!(doc.summary.avg_price_5m, 100.25);
        assert_eq!(doc.summary.trade_count_24h, 9_876);
        assert_eq!(doc.book_ticker.bid_qty, 2.0);

        assert_eq!(doc.depth_analysis.total_bid_depth, 5.0);
        assert_eq!(doc.depth_analysis.total_ask_depth, 5.0);
        assert_eq!(doc.depth_analysis.bid_ask_ratio, 1.0);
        assert_eq!(doc.spread.absolute, 1.0);

        assert_eq!(doc.trade_analysis.buy_trades, 7);
        assert_eq!(doc.trade_analysis.sell_trades, 3);
        assert!((doc.trade_analysis.avg_trade_size - 0.5).abs() < 1e-12);

        assert_eq!(doc.klines.one_hour.len(), 6);
        assert_eq!(doc.klines.one_hour[0].open_time, 18 * 3_600_000);
        assert_eq!(doc.klines.four_hours.len(), 6);
        assert_eq!(doc.klines.four_hours[5].open_time, 41 * 14_400_000);
        assert_eq!(doc.klines.one_day.len(), 4);

        assert!(out.path.starts_with(dir.path()));
        assert!(out
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("ethusdt_"));
        assert_eq!(SnapshotStore::load(&out.path).unwrap(), out.document);
    }

    #[tokio::test]
    async fn depth_failure_aborts_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("snapshots");
        let source = StubSource::failing_on("order_book");

        let err = assembler(Duration::from_secs(5))
            .create_snapshot("ETHUSDT", &source, Some(&out_dir))
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::DataUnavailable { .. }));
        assert_eq!(err.operation(), Some(FetchOperation::OrderBook));
        assert_eq!(source.calls(), vec!["ticker_price", "ticker_24h", "order_book"]);
        assert!(!out_dir.exists());
    }

    #[tokio::test]
    async fn kline_failure_names_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::failing_on("klines_4h");

        let err = assembler(Duration::from_secs(5))
            .create_snapshot("ETHUSDT", &source, Some(dir.path()))
            .await
            .unwrap_err();

        assert_eq!(err.operation(), Some(FetchOperation::Klines(KlineInterval::FourHours)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::stalling_on("avg_price");

        let err = assembler(Duration::from_millis(50))
            .create_snapshot("ETHUSDT", &source, Some(dir.path()))
            .await
            .unwrap_err();

        assert_eq!(err.operation(), Some(FetchOperation::AvgPrice));
        assert!(err.to_string().contains("timed out"), "{err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn blank_symbol_is_rejected_before_fetching() {
        let source = StubSource::new();
        let err = assembler(Duration::from_secs(5))
            .create_snapshot("  ", &source, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::InvalidSymbol));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = assembler(Duration::from_secs(5))
            .create_snapshot("ETHUSDT", &StubSource::new(), Some(&blocker))
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::Storage { .. }));
    }

    #[tokio::test]
    async fn build_document_uses_given_timestamp() {
        let source = StubSource::new();
        let data = assembler(Duration::from_secs(5))
            .collect("BTCUSDT", &source)
            .await
            .unwrap();

        let ts = chrono::NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let doc = build_document("BTCUSDT", &data, ts);

        assert_eq!(doc.timestamp, ts);
        assert_eq!(SnapshotStore::file_name(&doc, "BTCUSDT"), "btcusdt_20260102_030405.json");
    }
}
