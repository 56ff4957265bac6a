use printdesk_db::checks::models::{AutomatedCheck, CheckStatus};
use printdesk_db::checks::repositories::AutomatedCheckRepository;

use crate::error::SyncError;

pub const ALERT_THRESHOLD_CHECK: &str = "alert_thresholds";

/// Runs the database-side alert rule and records the run in `automated_checks`.
///
/// One row is created and updated exactly once per invocation. Rule failures
/// are not retried.
pub struct AlertCheckRunner<C> {
    checks: C,
}

impl<C> AlertCheckRunner<C>
where
    C: AutomatedCheckRepository,
{
    pub fn new(checks: C) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &C {
        &self.checks
    }

    pub async fn run(&self) -> Result<AutomatedCheck, SyncError> {
        let check = self.checks.start(ALERT_THRESHOLD_CHECK).await?;
        tracing::info!(check_id = %check.id, "alert check started");

        match self.checks.evaluate_alert_rules().await {
            Ok(()) => {
                let done = self
                    .checks
                    .finish(check.id, CheckStatus::Completed, None)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            check_id = %check.id,
                            error = %e,
                            "failed to record alert check completion"
                        );
                        e
                    })?;
                tracing::info!(check_id = %check.id, "alert check completed");
                Ok(done)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(check_id = %check.id, error = %message, "alert check failed");
                if let Err(finish_err) = self
                    .checks
                    .finish(check.id, CheckStatus::Error, Some(&message))
                    .await
                {
                    tracing::error!(
                        check_id = %check.id,
                        error = %finish_err,
                        "failed to record alert check failure"
                    );
                }
                Err(e.into())
            }
        }
    }
}
