pub mod handlers;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/amazon-sync",
        post(handlers::run_amazon_sync)
            .options(crate::preflight)
            .fallback(crate::method_not_allowed),
    )
}
