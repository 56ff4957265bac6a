use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived SP-API bearer token. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Order status as reported by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Shipped,
    Unshipped,
    Other(String),
}

impl OrderStatus {
    /// Only these statuses are carried into local storage.
    pub const SYNCABLE: [OrderStatus; 2] = [OrderStatus::Shipped, OrderStatus::Unshipped];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Shipped => "Shipped",
            Self::Unshipped => "Unshipped",
            Self::Other(s) => s,
        }
    }

    pub fn is_syncable(&self) -> bool {
        matches!(self, Self::Shipped | Self::Unshipped)
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Shipped" => Self::Shipped,
            "Unshipped" => Self::Unshipped,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

/// An order from `GET /orders/v0/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalOrder {
    #[serde(rename = "AmazonOrderId")]
    pub amazon_order_id: String,
    #[serde(rename = "OrderStatus")]
    pub status: OrderStatus,
    #[serde(rename = "PurchaseDate")]
    pub purchase_date: DateTime<Utc>,
}

/// A line item from `GET /orders/v0/orders/{id}/orderItems`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalOrderItem {
    #[serde(rename = "ASIN")]
    pub asin: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "QuantityOrdered", default)]
    pub quantity_ordered: u32,
    #[serde(rename = "SellerSKU", default, skip_serializing_if = "Option::is_none")]
    pub seller_sku: Option<String>,
}

impl ExternalOrderItem {
    /// Title to store locally; the ASIN stands in when the marketplace omits one.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.asin
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrdersPage {
    pub orders: Vec<ExternalOrder>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderItemsPage {
    pub items: Vec<ExternalOrderItem>,
    /// The raw `payload` object, passed through to HTTP callers.
    pub payload: serde_json::Value,
}

// ── Wire envelopes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    pub payload: OrdersPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersPayload {
    #[serde(rename = "Orders", default)]
    pub orders: Vec<ExternalOrder>,
    #[serde(rename = "NextToken", default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderItemsPayload {
    #[serde(rename = "OrderItems", default)]
    pub order_items: Vec<ExternalOrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("Atza|secret");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.as_str(), "Atza|secret");
    }

    #[test]
    fn order_status_parses_known_and_unknown() {
        assert_eq!(OrderStatus::from("Shipped".to_string()), OrderStatus::Shipped);
        assert_eq!(OrderStatus::from("Unshipped".to_string()), OrderStatus::Unshipped);
        let canceled = OrderStatus::from("Canceled".to_string());
        assert_eq!(canceled, OrderStatus::Other("Canceled".to_string()));
        assert!(!canceled.is_syncable());
        assert!(OrderStatus::SYNCABLE.iter().all(OrderStatus::is_syncable));
    }

    #[test]
    fn deserialize_orders_payload() {
        let json = r#"{
            "payload": {
                "Orders": [
                    {"AmazonOrderId": "111-0000001-0000001", "OrderStatus": "Shipped",
                     "PurchaseDate": "2023-01-02T10:00:00Z", "FulfillmentChannel": "MFN"},
                    {"AmazonOrderId": "111-0000002-0000002", "OrderStatus": "Pending",
                     "PurchaseDate": "2023-01-03T10:00:00Z"}
                ],
                "NextToken": "abc=="
            }
        }"#;
        let envelope: OrdersEnvelope = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(envelope.payload.orders.len(), 2);
        assert_eq!(envelope.payload.orders[0].status, OrderStatus::Shipped);
        assert_eq!(
            envelope.payload.orders[1].status,
            OrderStatus::Other("Pending".to_string())
        );
        assert_eq!(envelope.payload.next_token.as_deref(), Some("abc=="));
    }

    #[test]
    fn deserialize_order_item_with_missing_title() {
        let json = r#"{"ASIN": "B0TEST0001", "QuantityOrdered": 2}"#;
        let item: ExternalOrderItem = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(item.asin, "B0TEST0001");
        assert_eq!(item.quantity_ordered, 2);
        assert!(item.seller_sku.is_none());
        assert_eq!(item.display_title(), "B0TEST0001");
    }
}
