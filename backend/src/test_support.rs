//! Shared doubles and helpers for the handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::auth::rate_limit::RateLimitState;
use crate::config::Config;
use crate::db::MemoryLogStore;
use crate::router::build_router;
use crate::services::recommendation::{
    RecommendationError, RecommendationGateway, RecommendationRequest,
};
use crate::AppState;

pub fn test_config(webhook_url: &str) -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:3000".into(),
        cors_extra_origins: Vec::new(),
        jwt_secret: "test-secret".into(),
        jwt_audience: "authenticated".into(),
        auth_url: None,
        auth_anon_key: None,
        webhook_url: webhook_url.into(),
        webhook_secret: None,
        webhook_timeout_secs: 5,
        webhook_retries: 1,
        submit_rate_limit: 10,
        submit_rate_window_secs: 60,
    }
}

/// Mints an access token the way the auth provider would.
pub fn access_token(user_id: Uuid, email: Option<&str>, config: &Config) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.map(str::to_owned),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
        iat: Some(now.timestamp()),
        aud: config.jwt_audience.clone(),
        role: Some("authenticated".into()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap()
}

enum StubReply {
    Recommend(Option<String>),
    FailWith(u16),
}

/// Gateway double that records every call.
pub struct StubGateway {
    reply: StubReply,
    calls: AtomicUsize,
    last: Mutex<Option<RecommendationRequest>>,
}

impl StubGateway {
    fn with(reply: StubReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(StubReply::Recommend(Some(text.into())))
    }

    pub fn empty() -> Self {
        Self::with(StubReply::Recommend(None))
    }

    pub fn failing(status: u16) -> Self {
        Self::with(StubReply::FailWith(status))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecommendationRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecommendationGateway for StubGateway {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Option<String>, RecommendationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        match &self.reply {
            StubReply::Recommend(text) => Ok(text.clone()),
            StubReply::FailWith(status) => Err(RecommendationError::Status {
                status: *status,
                body: "stub failure".into(),
            }),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryLogStore>,
    pub gateway: Arc<StubGateway>,
    pub config: Config,
}

impl TestApp {
    pub fn new(gateway: StubGateway) -> Self {
        Self::with_config(gateway, test_config("http://127.0.0.1:9/webhook"))
    }

    pub fn with_config(gateway: StubGateway, config: Config) -> Self {
        let store = Arc::new(MemoryLogStore::new());
        let gateway = Arc::new(gateway);
        let state = AppState {
            store: store.clone(),
            recommender: gateway.clone(),
            config: Arc::new(config.clone()),
            http: reqwest::Client::new(),
            rate_limiter: RateLimitState::new(
                config.submit_rate_limit,
                Duration::from_secs(config.submit_rate_window_secs),
            ),
        };
        Self {
            router: build_router(state),
            store,
            gateway,
            config,
        }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        access_token(user_id, Some("u1@example.com"), &self.config)
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn submit(&self, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(post_json("/api/moods", token, body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
