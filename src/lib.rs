//! Market Snapshot - Binance public market-data analytics
//!
//! Fetches one spot symbol's price, 24h statistics, depth, recent trades,
//! 5m average, book ticker and 1h/4h/1d candles, derives spread, depth and
//! trade analytics, and persists the result as a JSON document.
//!
//! - `binance`: REST client implementing [`market_data::MarketDataSource`]
//! - `snapshot`: assembler, document schema, analytics and file store
//! - `config`, `logging`, `cli`, `display`: the binary's ambient pieces

pub mod binance;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod market_data;
pub mod snapshot;

pub use binance::BinanceClient;
pub use error::{FetchOperation, SnapshotError};
pub use snapshot::{PersistedSnapshot, SnapshotAssembler, SnapshotDocument, SnapshotStore};
