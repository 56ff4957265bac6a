use printdesk_common::error::PrintdeskError;
use printdesk_db::products::models::NewProduct;
use printdesk_db::products::repositories::ProductRepository;
use printdesk_marketplace::retry::{with_retry, RetryPolicy};
use printdesk_marketplace::ExternalOrderItem;

use crate::error::SyncError;

/// What reconciliation did for one marketplace item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductAction {
    Inserted,
    AlreadyPresent,
}

/// Ensures a local product row exists for every ASIN seen on the marketplace.
///
/// Existing rows are never touched, so titles edited locally survive
/// subsequent syncs.
pub struct ProductReconciler<P> {
    repo: P,
    retry: RetryPolicy,
}

impl<P> ProductReconciler<P>
where
    P: ProductRepository,
{
    pub fn new(repo: P, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    pub fn repo(&self) -> &P {
        &self.repo
    }

    pub async fn reconcile(&self, item: &ExternalOrderItem) -> Result<ProductAction, SyncError> {
        let asin = item.asin.trim();
        if asin.is_empty() {
            return Err(SyncError::Unexpected(
                "order item has no ASIN".to_string(),
            ));
        }

        let product = NewProduct {
            asin: asin.to_string(),
            title: item.display_title().to_string(),
        };
        let product = &product;
        let repo = &self.repo;

        with_retry(&self.retry, "sync_product", move || async move {
            if repo.find_by_asin(&product.asin).await?.is_some() {
                return Ok::<_, PrintdeskError>(ProductAction::AlreadyPresent);
            }
            // A concurrent insert between lookup and insert is also a no-op.
            if repo.insert_if_absent(product).await? {
                Ok(ProductAction::Inserted)
            } else {
                Ok(ProductAction::AlreadyPresent)
            }
        })
        .await
        .map_err(|e| SyncError::from(e.last_error))
    }

    /// Reconcile one item, reporting only whether it ended up present locally.
    pub async fn sync_product(&self, item: &ExternalOrderItem) -> bool {
        match self.reconcile(item).await {
            Ok(action) => {
                tracing::debug!(asin = %item.asin, ?action, "product reconciled");
                true
            }
            Err(e) => {
                tracing::warn!(asin = %item.asin, error = %e, "product sync failed");
                false
            }
        }
    }
}
