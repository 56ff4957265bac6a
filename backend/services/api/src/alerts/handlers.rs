use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use crate::alerts::requests::SendAlertEmailRequest;
use crate::alerts::responses::{CheckAlertsResponse, SendAlertEmailResponse};
use crate::email::render::render_alerts_html;
use crate::error::ApiError;
use crate::extractors::BearerToken;
use crate::AppState;

pub async fn check_alerts(
    BearerToken(_token): BearerToken,
    State(state): State<AppState>,
) -> Result<Json<CheckAlertsResponse>, ApiError> {
    let check = state.alert_checks.run().await?;
    Ok(Json(CheckAlertsResponse {
        success: true,
        message: format!("alert check {} completed", check.id),
    }))
}

pub async fn send_alert_email(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendAlertEmailResponse>, ApiError> {
    let request: SendAlertEmailRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;

    let to = non_blank(request.to.as_deref()).ok_or_else(|| ApiError::bad_request("to is required"))?;
    let subject = non_blank(request.subject.as_deref())
        .ok_or_else(|| ApiError::bad_request("subject is required"))?;
    let alerts = request
        .alerts
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::bad_request("alerts must be a non-empty list"))?;

    let client = state.email.get()?;
    let html = render_alerts_html(subject, &alerts);
    let id = client.send(to, subject, &html).await?;

    Ok(Json(SendAlertEmailResponse { success: true, id }))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
