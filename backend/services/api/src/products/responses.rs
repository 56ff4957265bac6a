use chrono::{DateTime, Utc};
use printdesk_marketplace::ExternalOrderItem;
use serde::Serialize;

/// Per-item outcome: `{asin, success}` or `{asin, error}`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ProductResult {
    Synced { asin: String, success: bool },
    Failed { asin: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct OrderProductsResponse {
    pub success: bool,
    pub items: Vec<ExternalOrderItem>,
    pub results: Vec<ProductResult>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
