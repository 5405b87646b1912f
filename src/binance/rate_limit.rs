// =============================================================================
// Request-Weight Tracker — observes Binance API usage for one session
// =============================================================================
//
// Binance limits request weight to 6000 per minute per IP and reports the
// running total in the `X-MBX-USED-WEIGHT-1M` response header. A snapshot
// costs well under 100 weight, so this never throttles: it only records the
// counters and warns when another process on the same IP is eating the budget.
// =============================================================================

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, warn};

/// Header carrying the used request weight for the current minute.
pub const USED_WEIGHT_HEADER: &str = "X-MBX-USED-WEIGHT-1M";

/// Weight above which every response logs a warning.
const WEIGHT_WARN_THRESHOLD: u32 = 4800;

/// Thread-safe request counters backed by atomics.
pub struct WeightTracker {
    used_weight_1m: AtomicU32,
    requests: AtomicU64,
}

impl WeightTracker {
    pub fn new() -> Self {
        Self {
            used_weight_1m: AtomicU32::new(0),
            requests: AtomicU64::new(0),
        }
    }

    /// Count one completed request and pick up the weight header, if any.
    pub fn record(&self, headers: &reqwest::header::HeaderMap) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let Some(weight) = headers
            .get(USED_WEIGHT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok())
        else {
            return;
        };

        let prev = self.used_weight_1m.swap(weight, Ordering::Relaxed);
        if weight >= WEIGHT_WARN_THRESHOLD {
            warn!(
                used_weight = weight,
                previous = prev,
                threshold = WEIGHT_WARN_THRESHOLD,
                "request weight above warning threshold"
            );
        } else {
            debug!(used_weight_1m = weight, "request weight updated from header");
        }
    }

    /// Last weight reported by the exchange (0 until a header is seen).
    pub fn used_weight(&self) -> u32 {
        self.used_weight_1m.load(Ordering::Relaxed)
    }

    /// Requests that received a response.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl Default for WeightTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WeightTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightTracker")
            .field("used_weight_1m", &self.used_weight())
            .field("requests", &self.requests())
            .finish()
    }
}
