//! Snapshot pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::market_data::KlineInterval;

/// Identity of a single request issued while assembling a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOperation {
    TickerPrice,
    Ticker24h,
    OrderBook,
    RecentTrades,
    AvgPrice,
    BookTicker,
    Klines(KlineInterval),
}

impl std::fmt::Display for FetchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TickerPrice => write!(f, "ticker price"),
            Self::Ticker24h => write!(f, "24h ticker"),
            Self::OrderBook => write!(f, "order book"),
            Self::RecentTrades => write!(f, "recent trades"),
            Self::AvgPrice => write!(f, "average price"),
            Self::BookTicker => write!(f, "book ticker"),
            Self::Klines(interval) => write!(f, "{interval} klines"),
        }
    }
}

/// Snapshot assembly and storage errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Symbol was empty or blank.
    #[error("symbol must not be empty")]
    InvalidSymbol,

    /// A fetch failed: connectivity, HTTP status, malformed body, unknown
    /// symbol or timeout.
    #[error("{operation} unavailable: {source:#}")]
    DataUnavailable {
        operation: FetchOperation,
        #[source]
        source: anyhow::Error,
    },

    /// Filesystem failure while writing or reading a snapshot.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be encoded.
    #[error("failed to serialise snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Stored file does not match the snapshot schema.
    #[error("corrupt snapshot at {}: {source}", path.display())]
    CorruptSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    pub fn unavailable(operation: FetchOperation, source: anyhow::Error) -> Self {
        Self::DataUnavailable { operation, source }
    }

    /// The failing request, when the error came from a fetch.
    pub fn operation(&self) -> Option<FetchOperation> {
        match self {
            Self::DataUnavailable { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_unavailable_names_the_operation() {
        let err = SnapshotError::unavailable(
            FetchOperation::Klines(KlineInterval::FourHours),
            anyhow::anyhow!("connection refused"),
        );
        assert_eq!(err.operation(), Some(FetchOperation::Klines(KlineInterval::FourHours)));
        assert_eq!(err.to_string(), "4h klines unavailable: connection refused");
    }

    #[test]
    fn storage_errors_carry_no_operation() {
        let err = SnapshotError::Storage {
            path: PathBuf::from("snapshots/x.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.operation().is_none());
        assert!(err.to_string().starts_with("storage error at snapshots/x.json"));
    }
}
