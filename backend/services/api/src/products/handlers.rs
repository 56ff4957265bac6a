use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use printdesk_marketplace::Marketplace;

use crate::error::ApiError;
use crate::products::requests::OrderProductsRequest;
use crate::products::responses::{OrderProductsResponse, ProductResult};
use crate::AppState;

/// Fetch the line items of one order and reconcile their products.
///
/// Marketplace configuration is checked before the body, so a missing
/// credential is reported even for malformed requests.
pub async fn sync_order_products(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OrderProductsResponse>, ApiError> {
    let services = state.marketplace.get()?;

    let request: OrderProductsRequest = if body.is_empty() {
        OrderProductsRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?
    };
    let order_id = request
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("orderId is required"))?;

    let token = services.client.get_access_token().await?;
    let page = services.client.get_order_items(&token, order_id).await?;

    let reconciler = services.reconciler();
    let mut results = Vec::with_capacity(page.items.len());
    for item in &page.items {
        let result = match reconciler.reconcile(item).await {
            Ok(_) => ProductResult::Synced {
                asin: item.asin.clone(),
                success: true,
            },
            Err(e) => ProductResult::Failed {
                asin: item.asin.clone(),
                error: e.to_string(),
            },
        };
        results.push(result);
    }

    tracing::info!(order_id, items = page.items.len(), "order products synced");
    Ok(Json(OrderProductsResponse {
        success: true,
        items: page.items,
        results,
        payload: page.payload,
        timestamp: Utc::now(),
    }))
}
