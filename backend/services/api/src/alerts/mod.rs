pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/check-alerts",
            post(handlers::check_alerts)
                .options(crate::preflight)
                .fallback(crate::method_not_allowed),
        )
        .route(
            "/send-alert-email",
            post(handlers::send_alert_email)
                .options(crate::preflight)
                .fallback(crate::method_not_allowed),
        )
}
