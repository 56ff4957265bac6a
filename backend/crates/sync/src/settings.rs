use std::time::Duration;

use printdesk_common::error::{PrintdeskError, PrintdeskResult};
use printdesk_config::parse_var_or;
use printdesk_marketplace::retry::RetryPolicy;

/// Sync type tag written to `sync_history` and `sync_locks`.
pub const AMAZON_ORDERS_SYNC: &str = "amazon_orders";

/// Fixed waits that keep the pipeline inside the marketplace rate limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    pub between_items: Duration,
    pub between_orders: Duration,
    pub between_batches: Duration,
    pub between_pages: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_items: Duration::from_millis(500),
            between_orders: Duration::from_secs(1),
            between_batches: Duration::from_secs(3),
            between_pages: Duration::from_secs(5),
        }
    }
}

impl PacingConfig {
    pub fn none() -> Self {
        Self {
            between_items: Duration::ZERO,
            between_orders: Duration::ZERO,
            between_batches: Duration::ZERO,
            between_pages: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub sync_type: String,
    pub batch_size: usize,
    pub pacing: PacingConfig,
    /// How far back the first run looks when no watermark exists.
    pub initial_lookback: chrono::Duration,
    /// Wall-clock budget for one run.
    pub max_run: Duration,
    /// A `running` lock with an older heartbeat is considered abandoned.
    pub lock_stale_after: chrono::Duration,
    /// Retry policy for product reconciliation and order persistence.
    pub store_retry: RetryPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_type: AMAZON_ORDERS_SYNC.to_string(),
            batch_size: 5,
            pacing: PacingConfig::default(),
            initial_lookback: chrono::Duration::days(30),
            max_run: Duration::from_secs(840),
            lock_stale_after: chrono::Duration::seconds(900),
            store_retry: RetryPolicy::exponential(4),
        }
    }
}

impl SyncSettings {
    /// Defaults overridden by `SYNC_*` environment variables.
    pub fn from_env() -> PrintdeskResult<Self> {
        let defaults = Self::default();

        let batch_size: usize = parse_var_or("SYNC_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            return Err(PrintdeskError::Config(
                "SYNC_BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        let pacing = PacingConfig {
            between_items: millis_var("SYNC_ITEM_DELAY_MS", defaults.pacing.between_items)?,
            between_orders: millis_var("SYNC_ORDER_DELAY_MS", defaults.pacing.between_orders)?,
            between_batches: millis_var("SYNC_BATCH_DELAY_MS", defaults.pacing.between_batches)?,
            between_pages: millis_var("SYNC_PAGE_DELAY_MS", defaults.pacing.between_pages)?,
        };

        Ok(Self {
            batch_size,
            pacing,
            initial_lookback: chrono::Duration::days(parse_var_or(
                "SYNC_INITIAL_LOOKBACK_DAYS",
                defaults.initial_lookback.num_days(),
            )?),
            max_run: Duration::from_secs(parse_var_or(
                "SYNC_MAX_RUN_SECS",
                defaults.max_run.as_secs(),
            )?),
            lock_stale_after: chrono::Duration::seconds(parse_var_or(
                "SYNC_LOCK_STALE_SECS",
                defaults.lock_stale_after.num_seconds(),
            )?),
            ..defaults
        })
    }
}

fn millis_var(key: &str, default: Duration) -> PrintdeskResult<Duration> {
    let ms: u64 = parse_var_or(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}
