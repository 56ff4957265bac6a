use std::process::ExitCode;
use std::sync::Arc;

use printdesk_config::{init_tracing, AppConfig};
use printdesk_db::checks::pg_repository::PgAutomatedCheckRepository;
use printdesk_db::orders::pg_repository::PgOrderRepository;
use printdesk_db::products::pg_repository::PgProductRepository;
use printdesk_db::sync::pg_repository::PgSyncRepository;
use printdesk_marketplace::{SpApiClient, SpApiConfig};
use printdesk_sync::{
    AlertCheckRunner, MarketplaceSyncer, OrderSynchronizer, ProductReconciler, SyncError,
    SyncSettings,
};

/// One-shot run for cron-style schedulers: a marketplace sync, then an
/// alert check. Exits non-zero when either step fails.
#[tokio::main]
async fn main() -> ExitCode {
    // Loads `.env` before the subscriber reads RUST_LOG and LOG_LEVEL.
    let config = AppConfig::from_env();
    init_tracing(config.as_ref().map_or("info", |c| c.log_level.as_str()));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration incomplete");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(service = "printdesk-ingest", "starting");

    let pool = printdesk_db::create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Fails fast with every missing AMAZON_* variable listed.
    let sync_result = match (SpApiConfig::from_env(), SyncSettings::from_env()) {
        (Ok(config), Ok(settings)) => {
            let client = Arc::new(SpApiClient::new(config).expect("failed to create SP-API client"));
            let products = ProductReconciler::new(
                PgProductRepository::new(pool.clone()),
                settings.store_retry.clone(),
            );
            let orders = OrderSynchronizer::new(
                Arc::clone(&client),
                products,
                PgOrderRepository::new(pool.clone()),
                settings.pacing.between_items,
                settings.store_retry.clone(),
            );
            let syncer =
                MarketplaceSyncer::new(client, orders, PgSyncRepository::new(pool.clone()), settings);

            match syncer.run_sync().await {
                Ok(summary) => {
                    tracing::info!(
                        total = summary.total_orders,
                        success = summary.success_count,
                        errors = summary.error_count,
                        "marketplace sync completed"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(error = %e, "marketplace sync failed");
                    Err(e)
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "marketplace sync not configured");
            Err(SyncError::from(e))
        }
    };

    let checks = AlertCheckRunner::new(PgAutomatedCheckRepository::new(pool));
    let check_result = match checks.run().await {
        Ok(check) => {
            tracing::info!(check_id = %check.id, "alert check completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "alert check failed");
            Err(e)
        }
    };

    if run_succeeded(&sync_result, &check_result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_succeeded(sync: &Result<(), SyncError>, check: &Result<(), SyncError>) -> bool {
    match (sync, check) {
        (Ok(()), Ok(())) => true,
        // Another scheduler tick is already syncing; not a failure of this one.
        (Err(SyncError::AlreadyRunning(_)), Ok(())) => true,
        _ => false,
    }
}
