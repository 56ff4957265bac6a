use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use printdesk_common::error::PrintdeskError;
use printdesk_marketplace::SpApiError;
use printdesk_sync::SyncError;

use crate::email::client::ResendError;

/// Every failure leaves the API as `{"success": false, "error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PrintdeskError> for ApiError {
    fn from(err: PrintdeskError) -> Self {
        match &err {
            PrintdeskError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg.clone()),
            PrintdeskError::Validation(msg) => Self::bad_request(msg.clone()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::AlreadyRunning(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<SpApiError> for ApiError {
    fn from(err: SpApiError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<ResendError> for ApiError {
    fn from(err: ResendError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        let body = serde_json::json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
