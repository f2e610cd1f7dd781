use std::{env, time::Duration};

/// Coherence daemon configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between reconciliation/subscription ticks (default: 30)
    pub sync_interval_seconds: u64,
    /// Max campaigns reconciled per tick, 0 = unbounded (default: 16)
    pub reconcile_max_per_tick: usize,
    /// Max live subscriptions held at once, 0 = unbounded (default: 16)
    pub subscribe_max_per_tick: usize,
    /// Seconds to wait before reopening a failed subscription stream
    /// (default: 5)
    pub stream_retry_seconds: u64,
    /// Page size for delta event scans (default: 100)
    pub delta_page_size: u32,
    /// Maximum number of cache entries in the in-memory store
    /// (default: 10,000)
    pub cache_max_entries: usize,
}

const DEFAULT_SYNC_INTERVAL_SECONDS: u64 = 30;
const DEFAULT_RECONCILE_MAX_PER_TICK: usize = 16;
const DEFAULT_SUBSCRIBE_MAX_PER_TICK: usize = 16;
const DEFAULT_STREAM_RETRY_SECONDS: u64 = 5;
const DEFAULT_DELTA_PAGE_SIZE: u32 = 100;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Parses a positive integer from an environment variable, silently
/// falling back to the default on anything unset, unparsable, or zero.
fn positive_env<T: std::str::FromStr + PartialOrd + From<u8>>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > T::from(0))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SYNC_INTERVAL_SECONDS` - Seconds between ticks (default: 30)
    /// - `RECONCILE_MAX_PER_TICK` - Reconciliation fairness cap (default: 16)
    /// - `SUBSCRIBE_MAX_PER_TICK` - Subscription fairness cap (default: 16)
    /// - `STREAM_RETRY_SECONDS` - Subscription retry delay (default: 5)
    /// - `DELTA_PAGE_SIZE` - Delta scan page size (default: 100)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    pub fn from_env() -> Self {
        Self {
            sync_interval_seconds: positive_env(
                "SYNC_INTERVAL_SECONDS",
                DEFAULT_SYNC_INTERVAL_SECONDS,
            ),
            reconcile_max_per_tick: positive_env(
                "RECONCILE_MAX_PER_TICK",
                DEFAULT_RECONCILE_MAX_PER_TICK,
            ),
            subscribe_max_per_tick: positive_env(
                "SUBSCRIBE_MAX_PER_TICK",
                DEFAULT_SUBSCRIBE_MAX_PER_TICK,
            ),
            stream_retry_seconds: positive_env(
                "STREAM_RETRY_SECONDS",
                DEFAULT_STREAM_RETRY_SECONDS,
            ),
            delta_page_size: positive_env("DELTA_PAGE_SIZE", DEFAULT_DELTA_PAGE_SIZE),
            cache_max_entries: positive_env("CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES),
        }
    }

    /// Get the tick interval as a Duration.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_seconds)
    }

    /// Get the stream retry delay as a Duration.
    pub fn stream_retry(&self) -> Duration {
        Duration::from_secs(self.stream_retry_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
