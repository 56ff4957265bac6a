use async_trait::async_trait;
use sqlx::PgPool;

use crate::orders::models::OrderUpsert;
use crate::orders::repositories::OrderRepository;
use printdesk_common::error::{PrintdeskError, PrintdeskResult};

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn upsert_with_status(&self, order: &OrderUpsert) -> PrintdeskResult<()> {
        sqlx::query("select upsert_order_with_status($1, $2, $3, $4)")
            .bind(&order.amazon_order_id)
            .bind(&order.status)
            .bind(order.purchase_date)
            .bind(order.items_count)
            .execute(&self.pool)
            .await
            .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(())
    }
}
