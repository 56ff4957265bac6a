use async_trait::async_trait;

use crate::orders::models::OrderUpsert;
use printdesk_common::error::PrintdeskResult;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically insert or update an order together with its status.
    async fn upsert_with_status(&self, order: &OrderUpsert) -> PrintdeskResult<()>;
}
