//! Client side of the marketplace (Amazon Selling Partner API) integration:
//! OAuth token exchange, the paginated order feed, per-order line items, and
//! the retry/backoff helper shared by everything that talks to the network.

pub mod client;
pub mod connector;
pub mod models;
pub mod retry;

pub use client::{SpApiClient, SpApiConfig, SpApiError};
pub use connector::Marketplace;
pub use models::{AccessToken, ExternalOrder, ExternalOrderItem, OrderItemsPage, OrderStatus, OrdersPage};
