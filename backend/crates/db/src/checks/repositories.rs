use async_trait::async_trait;
use uuid::Uuid;

use crate::checks::models::{AutomatedCheck, CheckStatus};
use printdesk_common::error::PrintdeskResult;

#[async_trait]
pub trait AutomatedCheckRepository: Send + Sync {
    /// Insert a new check row in the `running` state.
    async fn start(&self, check_type: &str) -> PrintdeskResult<AutomatedCheck>;

    /// Set the terminal status and completion timestamp of a check.
    async fn finish(
        &self,
        id: Uuid,
        status: CheckStatus,
        error_message: Option<&str>,
    ) -> PrintdeskResult<AutomatedCheck>;

    /// Invoke the database-side alert threshold rule.
    async fn evaluate_alert_rules(&self) -> PrintdeskResult<()>;
}
