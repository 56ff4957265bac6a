use async_trait::async_trait;

use crate::products::models::{NewProduct, Product};
use printdesk_common::error::PrintdeskResult;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_asin(&self, asin: &str) -> PrintdeskResult<Option<Product>>;

    /// Insert the product unless a row with the same ASIN exists.
    /// Returns `true` if a row was inserted. Existing rows are never touched.
    async fn insert_if_absent(&self, product: &NewProduct) -> PrintdeskResult<bool>;
}
