use std::sync::Arc;

use chrono::{DateTime, Utc};
use printdesk_db::orders::repositories::OrderRepository;
use printdesk_db::products::repositories::ProductRepository;
use printdesk_db::sync::models::{NewSyncHistory, SyncLock, SyncRunStatus};
use printdesk_db::sync::repositories::{SyncHistoryRepository, SyncLockRepository};
use printdesk_marketplace::{AccessToken, ExternalOrder, Marketplace};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::SyncError;
use crate::order_sync::OrderSynchronizer;
use crate::settings::SyncSettings;

/// Result of one completed run, rendered as JSON by the HTTP trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total_orders: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Orders created after this instant were requested.
    pub start_date: DateTime<Utc>,
    /// When the run finished.
    pub end_date: DateTime<Utc>,
}

impl SyncSummary {
    pub fn status(&self) -> SyncRunStatus {
        if self.success_count == self.total_orders {
            SyncRunStatus::Success
        } else {
            SyncRunStatus::Partial
        }
    }
}

/// Drives one marketplace sync run end to end.
///
/// A run holds the `sync_locks` row of its sync type for its whole duration
/// and writes exactly one `sync_history` row, whatever the outcome.
pub struct MarketplaceSyncer<M, P, O, S> {
    marketplace: Arc<M>,
    orders: OrderSynchronizer<M, P, O>,
    store: S,
    settings: SyncSettings,
}

impl<M, P, O, S> MarketplaceSyncer<M, P, O, S>
where
    M: Marketplace,
    P: ProductRepository,
    O: OrderRepository,
    S: SyncHistoryRepository + SyncLockRepository,
{
    pub fn new(
        marketplace: Arc<M>,
        orders: OrderSynchronizer<M, P, O>,
        store: S,
        settings: SyncSettings,
    ) -> Self {
        Self {
            marketplace,
            orders,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn order_synchronizer(&self) -> &OrderSynchronizer<M, P, O> {
        &self.orders
    }

    pub async fn run_sync(&self) -> Result<SyncSummary, SyncError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let sync_type = self.settings.sync_type.as_str();

        let lock = match self.acquire_lock(run_id).await {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                let err = SyncError::AlreadyRunning(sync_type.to_string());
                tracing::warn!(sync_type, "sync already running, not starting another");
                self.record_failure(started_at, &err).await;
                return Err(err);
            }
            Err(e) => {
                tracing::error!(sync_type, error = %e, "could not acquire sync lock");
                self.record_failure(started_at, &e).await;
                return Err(e);
            }
        };

        tracing::info!(sync_type, %run_id, "sync started");
        let result = self.run_locked(run_id, started_at, lock.last_synced_at).await;

        if let Err(e) = &result {
            tracing::error!(sync_type, %run_id, error = %e, "sync failed");
            self.record_failure(started_at, e).await;
        }

        if let Err(e) = self.store.release_lock(sync_type, run_id).await {
            tracing::error!(sync_type, %run_id, error = %e, "failed to release sync lock");
        }

        result
    }

    /// Run on a spawned task and wait for it.
    ///
    /// Dropping the returned future does not cancel the run: it still writes
    /// its history row and releases the lock. Use this from request handlers,
    /// whose futures are dropped when the client disconnects.
    pub async fn run_detached(self: Arc<Self>) -> Result<SyncSummary, SyncError>
    where
        M: 'static,
        P: 'static,
        O: 'static,
        S: 'static,
    {
        let sync_type = self.settings.sync_type.clone();
        tokio::spawn(async move { self.run_sync().await })
            .await
            .map_err(|e| {
                tracing::error!(sync_type = %sync_type, error = %e, "sync task did not finish");
                SyncError::Unexpected(format!("sync task did not finish: {e}"))
            })?
    }

    async fn acquire_lock(&self, run_id: Uuid) -> Result<Option<SyncLock>, SyncError> {
        let sync_type = self.settings.sync_type.as_str();
        self.store.get_or_create(sync_type).await?;
        let stale_before = Utc::now() - self.settings.lock_stale_after;
        Ok(self
            .store
            .acquire_lock(sync_type, run_id, stale_before)
            .await?)
    }

    async fn run_locked(
        &self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<SyncSummary, SyncError> {
        let deadline = Instant::now() + self.settings.max_run;
        let created_after =
            watermark.unwrap_or_else(|| started_at - self.settings.initial_lookback);

        let token = self.marketplace.get_access_token().await?;
        let mut orders = self
            .fetch_all_orders(run_id, &token, created_after, deadline)
            .await?;
        orders.sort_by_key(|o| o.purchase_date);

        tracing::info!(
            total = orders.len(),
            created_after = %created_after,
            "fetched orders"
        );

        let progress = self.process_orders(run_id, &token, &orders, deadline).await;

        let summary = SyncSummary {
            total_orders: orders.len(),
            success_count: progress.success_count,
            error_count: orders.len() - progress.success_count,
            start_date: created_after,
            end_date: Utc::now(),
        };
        let status = summary.status();
        let error_message = (status == SyncRunStatus::Partial).then(|| {
            format!(
                "{} of {} orders failed",
                summary.error_count, summary.total_orders
            )
        });

        self.store
            .insert(NewSyncHistory {
                sync_type: self.settings.sync_type.clone(),
                started_at,
                completed_at: summary.end_date,
                items_processed: to_i32(summary.success_count),
                status,
                error_message,
            })
            .await?;

        if let Some(synced_through) = progress.synced_through {
            // The history row is already written; a lagging watermark only
            // means the next run re-fetches a few orders.
            if let Err(e) = self
                .store
                .advance_watermark(&self.settings.sync_type, run_id, synced_through)
                .await
            {
                tracing::warn!(error = %e, "failed to advance sync watermark");
            }
        }

        tracing::info!(
            total = summary.total_orders,
            success = summary.success_count,
            errors = summary.error_count,
            status = %status,
            "sync completed"
        );
        Ok(summary)
    }

    async fn fetch_all_orders(
        &self,
        run_id: Uuid,
        token: &AccessToken,
        created_after: DateTime<Utc>,
        deadline: Instant,
    ) -> Result<Vec<ExternalOrder>, SyncError> {
        let mut orders = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0u32;

        loop {
            if page > 0 {
                tokio::time::sleep(self.settings.pacing.between_pages).await;
            }
            if Instant::now() >= deadline {
                return Err(SyncError::TransientFetch(format!(
                    "run deadline reached after {page} pages"
                )));
            }
            self.heartbeat(run_id).await;

            let result = self
                .marketplace
                .get_orders(token, created_after, cursor.as_deref(), Some(deadline))
                .await?;
            page += 1;

            tracing::debug!(
                page,
                orders = result.orders.len(),
                more = result.next_cursor.is_some(),
                "fetched order page"
            );
            orders.extend(result.orders);

            match result.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(orders),
            }
        }
    }

    async fn process_orders(
        &self,
        run_id: Uuid,
        token: &AccessToken,
        orders: &[ExternalOrder],
        deadline: Instant,
    ) -> RunProgress {
        let pacing = &self.settings.pacing;
        let mut progress = RunProgress::default();
        let mut prefix_intact = true;
        let mut deadline_hit = false;

        for (batch_no, batch) in orders.chunks(self.settings.batch_size.max(1)).enumerate() {
            if batch_no > 0 {
                tokio::time::sleep(pacing.between_batches).await;
                self.heartbeat(run_id).await;
            }

            for (i, order) in batch.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(pacing.between_orders).await;
                }
                if Instant::now() >= deadline {
                    if !deadline_hit {
                        tracing::warn!(
                            remaining = orders.len() - progress.attempted,
                            "run deadline reached, remaining orders count as errors"
                        );
                        deadline_hit = true;
                    }
                    prefix_intact = false;
                    continue;
                }

                progress.attempted += 1;
                let outcome = self.orders.sync_order(token, order).await;
                if outcome.success {
                    progress.success_count += 1;
                    if prefix_intact {
                        progress.synced_through = Some(order.purchase_date);
                    }
                } else {
                    prefix_intact = false;
                }
            }

            if deadline_hit {
                break;
            }
        }

        progress
    }

    async fn heartbeat(&self, run_id: Uuid) {
        if let Err(e) = self.store.heartbeat(&self.settings.sync_type, run_id).await {
            tracing::warn!(error = %e, "failed to refresh sync lock heartbeat");
        }
    }

    /// Write the single `error` history row of a failed run.
    async fn record_failure(&self, started_at: DateTime<Utc>, err: &SyncError) {
        let entry = NewSyncHistory {
            sync_type: self.settings.sync_type.clone(),
            started_at,
            completed_at: Utc::now(),
            items_processed: 0,
            status: SyncRunStatus::Error,
            error_message: Some(err.to_string()),
        };
        if let Err(e) = self.store.insert(entry).await {
            tracing::error!(error = %e, "failed to record sync failure");
        }
    }
}

#[derive(Debug, Default)]
struct RunProgress {
    attempted: usize,
    success_count: usize,
    /// Purchase date of the last order in the fully successful prefix.
    synced_through: Option<DateTime<Utc>>,
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
