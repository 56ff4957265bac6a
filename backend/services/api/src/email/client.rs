use std::time::Duration;

use printdesk_common::error::PrintdeskResult;
use printdesk_config::{parse_var_or, require_vars};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://api.resend.com";
const DEFAULT_FROM: &str = "Printdesk Alerts <alerts@printdesk.app>";

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub from: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl ResendConfig {
    /// Requires `RESEND_API_KEY`; sender and endpoint have defaults.
    pub fn from_env() -> PrintdeskResult<Self> {
        let api_key = require_vars(&["RESEND_API_KEY"])?
            .into_iter()
            .next()
            .unwrap_or_default();
        Ok(Self {
            api_key,
            from: parse_var_or("ALERT_EMAIL_FROM", DEFAULT_FROM.to_string())?,
            api_url: parse_var_or("RESEND_API_URL", DEFAULT_API_URL.to_string())?,
            timeout_secs: parse_var_or("RESEND_TIMEOUT_SECS", 15)?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResendError {
    #[error("email provider returned HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("email request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Thin client for the Resend transactional email API.
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    config: ResendConfig,
}

impl ResendClient {
    pub fn new(config: ResendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Send one HTML email, returning the provider's message id.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, ResendError> {
        let url = format!("{}/emails", self.config.api_url.trim_end_matches('/'));
        let body = SendEmailBody {
            from: &self.config.from,
            to: [to],
            subject,
            html,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResendError::HttpError { status, body });
        }

        let sent: SendEmailResponse = resp.json().await?;
        tracing::info!(email_id = %sent.id, "alert email sent");
        Ok(sent.id)
    }
}
