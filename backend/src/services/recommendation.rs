use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::Config;

/// Returned to the user when the webhook answered but carried no usable text.
pub const NO_RECOMMENDATION: &str = "No recommendation found.";

const RETRY_DELAY: Duration = Duration::from_millis(200);
const MAX_LOGGED_BODY: usize = 512;

/// Outbound webhook payload.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRequest {
    pub mood: String,
    pub user_id: Uuid,
    pub email: Option<String>,
    pub rating: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("recommendation webhook timed out")]
    Timeout,

    #[error("recommendation webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("recommendation webhook unreachable: {0}")]
    Transport(String),

    #[error("recommendation webhook returned a malformed body: {0}")]
    Malformed(String),
}

impl RecommendationError {
    fn is_retryable(&self) -> bool {
        match self {
            RecommendationError::Timeout | RecommendationError::Transport(_) => true,
            RecommendationError::Status { status, .. } => *status >= 500,
            RecommendationError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for RecommendationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RecommendationError::Timeout
        } else if e.is_decode() {
            RecommendationError::Malformed(e.to_string())
        } else {
            RecommendationError::Transport(e.to_string())
        }
    }
}

#[async_trait]
pub trait RecommendationGateway: Send + Sync {
    /// `Ok(None)` means the webhook succeeded but sent no recommendation.
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Option<String>, RecommendationError>;
}

/// Calls the workflow webhook over HTTP with a per-attempt timeout and a
/// bounded number of retries for timeouts, transport errors and 5xx.
pub struct WebhookGateway {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
    max_attempts: u32,
}

impl WebhookGateway {
    pub fn new(
        url: impl Into<String>,
        secret: Option<String>,
        timeout: Duration,
        retries: u32,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            secret,
            max_attempts: retries.saturating_add(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.webhook_url.clone(),
            config.webhook_secret.clone(),
            Duration::from_secs(config.webhook_timeout_secs),
            config.webhook_retries,
        )
    }

    async fn attempt(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Option<String>, RecommendationError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(secret) = &self.secret {
            builder = builder.header("x-webhook-secret", secret);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_LOGGED_BODY {
                let cut = (0..=MAX_LOGGED_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(RecommendationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

#[async_trait]
impl RecommendationGateway for WebhookGateway {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Option<String>, RecommendationError> {
        let mut attempt = 1;
        loop {
            match self.attempt(request).await {
                Ok(recommendation) => return Ok(recommendation),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        attempt = attempt,
                        user_id = %request.user_id,
                        error = %e,
                        "Recommendation webhook attempt failed, retrying"
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// An empty body counts as "no recommendation"; anything else must be JSON.
fn parse_body(body: &str) -> Result<Option<String>, RecommendationError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| RecommendationError::Malformed(e.to_string()))?;
    Ok(extract_recommendation(&value))
}

/// Accepts `{"recommendation": ".."}` or `[{"recommendation": ".."}, ..]`.
pub fn extract_recommendation(value: &Value) -> Option<String> {
    let candidate = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };

    candidate
        .get("recommendation")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
