use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::checks::models::{AutomatedCheck, CheckStatus};
use crate::checks::repositories::AutomatedCheckRepository;
use printdesk_common::error::{PrintdeskError, PrintdeskResult};

#[derive(Clone)]
pub struct PgAutomatedCheckRepository {
    pool: PgPool,
}

impl PgAutomatedCheckRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> PrintdeskResult<AutomatedCheck> {
        let status: String = row.get("status");
        Ok(AutomatedCheck {
            id: row.get("id"),
            check_type: row.get("check_type"),
            status: status.parse().map_err(PrintdeskError::Database)?,
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            error_message: row.get("error_message"),
        })
    }
}

#[async_trait]
impl AutomatedCheckRepository for PgAutomatedCheckRepository {
    async fn start(&self, check_type: &str) -> PrintdeskResult<AutomatedCheck> {
        let row = sqlx::query(
            "insert into automated_checks (id, check_type, status, started_at)
             values ($1, $2, 'running', $3)
             returning id, check_type, status, started_at, completed_at, error_message",
        )
        .bind(Uuid::new_v4())
        .bind(check_type)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Self::map_row(&row)
    }

    async fn finish(
        &self,
        id: Uuid,
        status: CheckStatus,
        error_message: Option<&str>,
    ) -> PrintdeskResult<AutomatedCheck> {
        let row = sqlx::query(
            "update automated_checks
             set status = $1, completed_at = $2, error_message = $3
             where id = $4
             returning id, check_type, status, started_at, completed_at, error_message",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(error_message)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?
        .ok_or_else(|| PrintdeskError::NotFound(format!("automated check {id}")))?;

        Self::map_row(&row)
    }

    async fn evaluate_alert_rules(&self) -> PrintdeskResult<()> {
        sqlx::query("select check_alert_thresholds()")
            .execute(&self.pool)
            .await
            .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    async fn test_repo() -> Option<PgAutomatedCheckRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");

        sqlx::query(
            "create table if not exists automated_checks (
               id uuid primary key default gen_random_uuid(),
               check_type text not null,
               status text not null,
               started_at timestamptz not null default now(),
               completed_at timestamptz,
               error_message text
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        Some(PgAutomatedCheckRepository::new(pool))
    }

    #[tokio::test]
    async fn start_then_finish_sets_completion() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let check = repo.start("alert_thresholds").await.expect("start");
        assert_eq!(check.status, CheckStatus::Running);
        assert!(check.completed_at.is_none());

        let done = repo
            .finish(check.id, CheckStatus::Error, Some("rule failed"))
            .await
            .expect("finish");
        assert_eq!(done.id, check.id);
        assert_eq!(done.status, CheckStatus::Error);
        assert!(done.completed_at.is_some());
        assert_eq!(done.error_message.as_deref(), Some("rule failed"));
    }

    #[tokio::test]
    async fn finish_unknown_check_is_not_found() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let err = repo
            .finish(Uuid::new_v4(), CheckStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PrintdeskError::NotFound(_)));
    }
}
