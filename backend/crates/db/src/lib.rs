pub mod checks;
pub mod orders;
pub mod products;
pub mod sync;

use printdesk_common::error::{PrintdeskError, PrintdeskResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a Postgres connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> PrintdeskResult<PgPool> {
    tracing::info!("connecting to database");
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))
}

/// Create a pool that connects on first use.
pub fn create_lazy_pool(database_url: &str) -> PrintdeskResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(database_url)
        .map_err(|e| PrintdeskError::Database(e.to_string()))
}
