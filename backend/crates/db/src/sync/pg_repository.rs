use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::sync::models::{NewSyncHistory, SyncHistory, SyncLock, SyncRunStatus};
use crate::sync::repositories::{SyncHistoryRepository, SyncLockRepository};
use printdesk_common::error::{PrintdeskError, PrintdeskResult};

const HISTORY_COLUMNS: &str =
    "id, sync_type, started_at, completed_at, items_processed, status, error_message, created_at";

const LOCK_COLUMNS: &str = "sync_type, status, run_id, heartbeat_at, last_synced_at, updated_at";

#[derive(Clone)]
pub struct PgSyncRepository {
    pool: PgPool,
}

impl PgSyncRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_history_row(row: &sqlx::postgres::PgRow) -> PrintdeskResult<SyncHistory> {
        let status: String = row.get("status");
        Ok(SyncHistory {
            id: row.get("id"),
            sync_type: row.get("sync_type"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            items_processed: row.get("items_processed"),
            status: status
                .parse::<SyncRunStatus>()
                .map_err(PrintdeskError::Database)?,
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
        })
    }

    fn map_lock_row(row: &sqlx::postgres::PgRow) -> SyncLock {
        SyncLock {
            sync_type: row.get("sync_type"),
            status: row.get("status"),
            run_id: row.get("run_id"),
            heartbeat_at: row.get("heartbeat_at"),
            last_synced_at: row.get("last_synced_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl SyncHistoryRepository for PgSyncRepository {
    async fn insert(&self, entry: NewSyncHistory) -> PrintdeskResult<SyncHistory> {
        let sql = format!(
            "insert into sync_history
             (id, sync_type, started_at, completed_at, items_processed, status, error_message)
             values ($1, $2, $3, $4, $5, $6, $7)
             returning {HISTORY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&entry.sync_type)
            .bind(entry.started_at)
            .bind(entry.completed_at)
            .bind(entry.items_processed)
            .bind(entry.status.as_str())
            .bind(&entry.error_message)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Self::map_history_row(&row)
    }

    async fn list_recent(&self, sync_type: &str, limit: i64) -> PrintdeskResult<Vec<SyncHistory>> {
        let sql = format!(
            "select {HISTORY_COLUMNS}
             from sync_history
             where sync_type = $1
             order by completed_at desc
             limit $2"
        );
        let rows = sqlx::query(&sql)
            .bind(sync_type)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        rows.iter().map(Self::map_history_row).collect()
    }
}

#[async_trait]
impl SyncLockRepository for PgSyncRepository {
    async fn get_or_create(&self, sync_type: &str) -> PrintdeskResult<SyncLock> {
        let sql = format!(
            "insert into sync_locks (sync_type)
             values ($1)
             on conflict (sync_type) do update set updated_at = now()
             returning {LOCK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(sync_type)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(Self::map_lock_row(&row))
    }

    async fn acquire_lock(
        &self,
        sync_type: &str,
        run_id: Uuid,
        stale_before: DateTime<Utc>,
    ) -> PrintdeskResult<Option<SyncLock>> {
        let sql = format!(
            "update sync_locks
             set status = 'running', run_id = $1, heartbeat_at = $2, updated_at = $2
             where sync_type = $3
               and (status != 'running' or heartbeat_at is null or heartbeat_at < $4)
             returning {LOCK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(run_id)
            .bind(Utc::now())
            .bind(sync_type)
            .bind(stale_before)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(row.as_ref().map(Self::map_lock_row))
    }

    async fn heartbeat(&self, sync_type: &str, run_id: Uuid) -> PrintdeskResult<()> {
        sqlx::query(
            "update sync_locks
             set heartbeat_at = $1, updated_at = $1
             where sync_type = $2 and run_id = $3",
        )
        .bind(Utc::now())
        .bind(sync_type)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(())
    }

    async fn advance_watermark(
        &self,
        sync_type: &str,
        run_id: Uuid,
        synced_through: DateTime<Utc>,
    ) -> PrintdeskResult<()> {
        sqlx::query(
            "update sync_locks
             set last_synced_at = greatest(coalesce(last_synced_at, $1), $1), updated_at = now()
             where sync_type = $2 and run_id = $3",
        )
        .bind(synced_through)
        .bind(sync_type)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(())
    }

    async fn release_lock(&self, sync_type: &str, run_id: Uuid) -> PrintdeskResult<()> {
        sqlx::query(
            "update sync_locks
             set status = 'idle', run_id = null, updated_at = now()
             where sync_type = $1 and run_id = $2",
        )
        .bind(sync_type)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(())
    }
}
