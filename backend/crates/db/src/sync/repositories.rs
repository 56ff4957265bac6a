use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::sync::models::{NewSyncHistory, SyncHistory, SyncLock};
use printdesk_common::error::PrintdeskResult;

/// Append-only run log. There is intentionally no update operation.
#[async_trait]
pub trait SyncHistoryRepository: Send + Sync {
    async fn insert(&self, entry: NewSyncHistory) -> PrintdeskResult<SyncHistory>;

    async fn list_recent(&self, sync_type: &str, limit: i64) -> PrintdeskResult<Vec<SyncHistory>>;
}

#[async_trait]
pub trait SyncLockRepository: Send + Sync {
    /// Get or create the lock row for a sync type.
    async fn get_or_create(&self, sync_type: &str) -> PrintdeskResult<SyncLock>;

    /// Atomically mark the row `running` for `run_id` if it is idle, or if the
    /// current holder's heartbeat is older than `stale_before`.
    /// Returns `None` if another run holds the lock.
    async fn acquire_lock(
        &self,
        sync_type: &str,
        run_id: Uuid,
        stale_before: DateTime<Utc>,
    ) -> PrintdeskResult<Option<SyncLock>>;

    async fn heartbeat(&self, sync_type: &str, run_id: Uuid) -> PrintdeskResult<()>;

    /// Move `last_synced_at` forward to `synced_through`; never moves it back.
    async fn advance_watermark(
        &self,
        sync_type: &str,
        run_id: Uuid,
        synced_through: DateTime<Utc>,
    ) -> PrintdeskResult<()>;

    /// Set the row back to `idle` if `run_id` still holds it.
    async fn release_lock(&self, sync_type: &str, run_id: Uuid) -> PrintdeskResult<()>;
}
