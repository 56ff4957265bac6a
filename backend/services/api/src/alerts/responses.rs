use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CheckAlertsResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendAlertEmailResponse {
    pub success: bool,
    pub id: String,
}
