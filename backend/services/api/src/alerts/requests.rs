use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub product_name: String,
    pub current_value: f64,
    pub threshold: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendAlertEmailRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub alerts: Option<Vec<AlertItem>>,
}
