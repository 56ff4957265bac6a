use std::sync::Arc;
use std::time::Duration;

use printdesk_db::orders::models::OrderUpsert;
use printdesk_db::orders::repositories::OrderRepository;
use printdesk_db::products::repositories::ProductRepository;
use printdesk_marketplace::retry::{with_retry, RetryPolicy};
use printdesk_marketplace::{AccessToken, ExternalOrder, ExternalOrderItem, Marketplace};

use crate::product_sync::ProductReconciler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSyncOutcome {
    /// Whether the order itself was persisted.
    pub success: bool,
    pub products_processed: usize,
}

/// Syncs a single order: its line items, their products, then the order row.
pub struct OrderSynchronizer<M, P, O> {
    marketplace: Arc<M>,
    products: ProductReconciler<P>,
    orders: O,
    item_delay: Duration,
    retry: RetryPolicy,
}

impl<M, P, O> OrderSynchronizer<M, P, O>
where
    M: Marketplace,
    P: ProductRepository,
    O: OrderRepository,
{
    pub fn new(
        marketplace: Arc<M>,
        products: ProductReconciler<P>,
        orders: O,
        item_delay: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            marketplace,
            products,
            orders,
            item_delay,
            retry,
        }
    }

    pub fn products(&self) -> &ProductReconciler<P> {
        &self.products
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Never fails: item-fetch problems degrade to an order with no items,
    /// persistence problems to `success: false`.
    pub async fn sync_order(&self, token: &AccessToken, order: &ExternalOrder) -> OrderSyncOutcome {
        let order_id = order.amazon_order_id.as_str();

        let items = match self.marketplace.get_order_items(token, order_id).await {
            Ok(page) => page.items,
            Err(e) => {
                tracing::warn!(order_id, error = %e, "order items unavailable, continuing without them");
                Vec::new()
            }
        };

        let mut products_processed = 0;
        for item in &items {
            tokio::time::sleep(self.item_delay).await;
            if self.products.sync_product(item).await {
                products_processed += 1;
            }
        }

        let upsert = OrderUpsert {
            amazon_order_id: order.amazon_order_id.clone(),
            status: order.status.as_str().to_string(),
            purchase_date: order.purchase_date,
            items_count: items_count(&items),
        };
        let upsert = &upsert;
        let orders = &self.orders;

        let success = match with_retry(&self.retry, "upsert_order", move || async move {
            orders.upsert_with_status(upsert).await
        })
        .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(order_id, error = %e, "order persistence failed");
                false
            }
        };

        tracing::debug!(order_id, success, products_processed, "order synced");
        OrderSyncOutcome {
            success,
            products_processed,
        }
    }
}

fn items_count(items: &[ExternalOrderItem]) -> i32 {
    let total: u64 = items.iter().map(|i| u64::from(i.quantity_ordered)).sum();
    i32::try_from(total).unwrap_or(i32::MAX)
}
