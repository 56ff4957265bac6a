//! The marketplace synchronization pipeline and the alert-check run recorder.
//!
//! ```text
//! MarketplaceSyncer ─┬─ Marketplace::get_access_token (once)
//!                    └─ loop pages ─ OrderSynchronizer::sync_order (per order)
//!                                    ├─ Marketplace::get_order_items
//!                                    ├─ ProductReconciler::sync_product (per item)
//!                                    └─ OrderRepository::upsert_with_status
//! ```

pub mod alert_check;
pub mod error;
pub mod orchestrator;
pub mod order_sync;
pub mod product_sync;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use alert_check::{AlertCheckRunner, ALERT_THRESHOLD_CHECK};
pub use error::SyncError;
pub use orchestrator::{MarketplaceSyncer, SyncSummary};
pub use order_sync::{OrderSyncOutcome, OrderSynchronizer};
pub use product_sync::{ProductAction, ProductReconciler};
pub use settings::{PacingConfig, SyncSettings, AMAZON_ORDERS_SYNC};
