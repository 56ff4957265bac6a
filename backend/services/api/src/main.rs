mod alerts;
mod email;
mod error;
mod extractors;
mod products;
mod state;
mod sync;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::get,
    Json, Router,
};
use printdesk_common::types::ServiceInfo;
use printdesk_config::{init_tracing, AppConfig};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use error::ApiError;
pub use state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("printdesk-api"))
}

/// Plain `OPTIONS` on a trigger route; CORS headers come from the layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on a trigger route, answered in the error envelope.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed"),
    )
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .merge(sync::router())
        .merge(products::router())
        .merge(alerts::router())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("failed to load config");
    init_tracing(&config.log_level);

    tracing::info!(service = "printdesk-api", "starting");

    let pool = printdesk_db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let state = AppState::from_env(pool);

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
