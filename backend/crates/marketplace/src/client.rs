use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use printdesk_common::error::PrintdeskResult;
use printdesk_config::{parse_var_or, require_vars};
use reqwest::{Client, StatusCode};
use tokio::time::Instant;

use crate::connector::Marketplace;
use crate::models::{
    AccessToken, OrderItemsPage, OrderItemsPayload, OrderStatus, OrdersEnvelope, OrdersPage,
    TokenResponse,
};
use crate::retry::{with_retry, Backoff, RetryPolicy};

/// Page size for the order feed.
pub const ORDERS_PAGE_SIZE: u32 = 50;

/// Environment variables that must be present before any marketplace call.
pub const REQUIRED_VARS: [&str; 4] = [
    "AMAZON_REFRESH_TOKEN",
    "AMAZON_CLIENT_ID",
    "AMAZON_CLIENT_SECRET",
    "AMAZON_MARKETPLACE_ID",
];

const DEFAULT_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";
const DEFAULT_API_BASE_URL: &str = "https://sellingpartnerapi-na.amazon.com";

#[derive(Debug, Clone)]
pub struct SpApiConfig {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub marketplace_id: String,
    pub token_url: String,
    pub api_base_url: String,
    /// Retries after the first attempt for token, order-item calls.
    pub max_retries: u32,
    /// Total attempts for one order feed page.
    pub order_fetch_max_attempts: u32,
    pub retry_base: Duration,
    pub retry_jitter: Duration,
    pub order_fetch_delay_min: Duration,
    pub order_fetch_delay_max: Duration,
    pub timeout_secs: u64,
}

impl SpApiConfig {
    /// Load SP-API config from environment.
    ///
    /// Fails with every missing credential name at once; no client can be
    /// built (and so no request made) until all of them are set.
    pub fn from_env() -> PrintdeskResult<Self> {
        let mut values = require_vars(&REQUIRED_VARS)?.into_iter();
        let mut next = || values.next().unwrap_or_default();

        Ok(Self {
            refresh_token: next(),
            client_id: next(),
            client_secret: next(),
            marketplace_id: next(),
            token_url: parse_var_or("AMAZON_TOKEN_URL", DEFAULT_TOKEN_URL.to_string())?,
            api_base_url: parse_var_or("AMAZON_API_BASE_URL", DEFAULT_API_BASE_URL.to_string())?,
            max_retries: parse_var_or("AMAZON_MAX_RETRIES", 3)?,
            order_fetch_max_attempts: parse_var_or("ORDER_FETCH_MAX_ATTEMPTS", 10)?,
            retry_base: Duration::from_secs(1),
            retry_jitter: Duration::from_secs(1),
            order_fetch_delay_min: Duration::from_secs(2),
            order_fetch_delay_max: Duration::from_secs(5),
            timeout_secs: parse_var_or("AMAZON_TIMEOUT_SECS", 30)?,
        })
    }

    fn exponential_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries + 1,
            Backoff::Exponential {
                base: self.retry_base,
                max_jitter: self.retry_jitter,
            },
        )
    }

    fn order_fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.order_fetch_max_attempts,
            Backoff::RandomRange {
                min: self.order_fetch_delay_min,
                max: self.order_fetch_delay_max,
            },
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpApiError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("token exchange failed after {attempts} attempts: {last_error}")]
    Auth { attempts: u32, last_error: String },

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

#[derive(Clone)]
pub struct SpApiClient {
    client: Client,
    config: SpApiConfig,
}

impl SpApiClient {
    pub fn new(config: SpApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SpApiConfig {
        &self.config
    }

    async fn request_token(&self) -> Result<AccessToken, SpApiError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpApiError::HttpError { status, body });
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(SpApiError::InvalidResponse(
                "token response has an empty access_token".to_string(),
            ));
        }
        tracing::debug!(expires_in = ?token.expires_in, "obtained access token");
        Ok(AccessToken::new(token.access_token))
    }

    async fn request_orders(
        &self,
        token: &AccessToken,
        created_after: DateTime<Utc>,
        cursor: Option<&str>,
    ) -> Result<OrdersPage, SpApiError> {
        let url = format!("{}/orders/v0/orders", self.config.api_base_url);
        let statuses = OrderStatus::SYNCABLE
            .iter()
            .map(OrderStatus::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut query = vec![
            ("MarketplaceIds", self.config.marketplace_id.clone()),
            (
                "CreatedAfter",
                created_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("OrderStatuses", statuses),
            ("MaxResultsPerPage", ORDERS_PAGE_SIZE.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("NextToken", cursor.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .header("x-amz-access-token", token.as_str())
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpApiError::HttpError { status, body });
        }

        let envelope: OrdersEnvelope = response.json().await?;
        let received = envelope.payload.orders.len();
        let orders: Vec<_> = envelope
            .payload
            .orders
            .into_iter()
            .filter(|o| o.status.is_syncable())
            .collect();
        if orders.len() < received {
            tracing::debug!(
                dropped = received - orders.len(),
                "filtered orders with unsynced statuses"
            );
        }

        Ok(OrdersPage {
            orders,
            next_cursor: envelope.payload.next_token.filter(|t| !t.is_empty()),
        })
    }

    async fn request_order_items(
        &self,
        token: &AccessToken,
        order_id: &str,
    ) -> Result<OrderItemsPage, SpApiError> {
        let url = format!(
            "{}/orders/v0/orders/{}/orderItems",
            self.config.api_base_url, order_id
        );

        let response = self
            .client
            .get(&url)
            .header("x-amz-access-token", token.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpApiError::HttpError { status, body });
        }

        let mut body: serde_json::Value = response.json().await?;
        let payload = body
            .get_mut("payload")
            .map(serde_json::Value::take)
            .ok_or_else(|| SpApiError::InvalidResponse("missing payload".to_string()))?;
        let parsed: OrderItemsPayload = serde_json::from_value(payload.clone())
            .map_err(|e| SpApiError::InvalidResponse(e.to_string()))?;

        Ok(OrderItemsPage {
            items: parsed.order_items,
            payload,
        })
    }
}

#[async_trait]
impl Marketplace for SpApiClient {
    /// Exchange the refresh token for an access token, retrying every failure.
    async fn get_access_token(&self) -> Result<AccessToken, SpApiError> {
        with_retry(&self.config.exponential_policy(), "get_access_token", || {
            self.request_token()
        })
        .await
        .map_err(|e| SpApiError::Auth {
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }

    async fn get_orders(
        &self,
        token: &AccessToken,
        created_after: DateTime<Utc>,
        cursor: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<OrdersPage, SpApiError> {
        let policy = self.config.order_fetch_policy().with_deadline(deadline);
        with_retry(&policy, "get_orders", || {
            self.request_orders(token, created_after, cursor)
        })
        .await
        .map_err(|e| SpApiError::MaxRetriesExceeded {
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }

    async fn get_order_items(
        &self,
        token: &AccessToken,
        order_id: &str,
    ) -> Result<OrderItemsPage, SpApiError> {
        with_retry(&self.config.exponential_policy(), "get_order_items", || {
            self.request_order_items(token, order_id)
        })
        .await
        .map_err(|e| SpApiError::MaxRetriesExceeded {
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }
}
