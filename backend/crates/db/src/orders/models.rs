use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Arguments of the `upsert_order_with_status` stored procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderUpsert {
    pub amazon_order_id: String,
    pub status: String,
    pub purchase_date: DateTime<Utc>,
    pub items_count: i32,
}
