pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/amazon-products",
        post(handlers::sync_order_products)
            .options(crate::preflight)
            .fallback(crate::method_not_allowed),
    )
}
