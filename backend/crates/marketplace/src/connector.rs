use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::client::SpApiError;
use crate::models::{AccessToken, OrderItemsPage, OrdersPage};

/// The marketplace operations the sync pipeline depends on.
///
/// Implementations own their retry policy; callers see only the final outcome.
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn get_access_token(&self) -> Result<AccessToken, SpApiError>;

    /// One page of `Shipped`/`Unshipped` orders created after `created_after`.
    /// Retrying stops early once `deadline` would be exceeded.
    async fn get_orders(
        &self,
        token: &AccessToken,
        created_after: DateTime<Utc>,
        cursor: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<OrdersPage, SpApiError>;

    async fn get_order_items(
        &self,
        token: &AccessToken,
        order_id: &str,
    ) -> Result<OrderItemsPage, SpApiError>;
}
