use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// Fixed-window counter per key, kept in process memory.
#[derive(Clone)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    max_requests: u32,
    window: Duration,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Check if the key is rate limited. Returns Ok(remaining) or Err(retry_after).
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            let retry_after = self
                .window
                .saturating_sub(now.duration_since(entry.window_start));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(self.max_requests - entry.count)
    }

    /// Drops entries whose window ended long ago.
    pub async fn cleanup(&self) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let keep_for = self.window * 2;

        entries.retain(|_, entry| now.duration_since(entry.window_start) < keep_for);
    }

    pub fn spawn_cleanup_worker(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }
}

/// Throttles mood submissions per authenticated user. Must run inside
/// `require_auth`.
pub async fn throttle_submissions(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id)
        .ok_or(AppError::Unauthorized)?;

    let key = format!("submit:{user_id}");

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(user_id = %user_id, remaining = remaining, "Submission rate check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            // Round up so clients never retry inside the window.
            let retry_after_secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            tracing::warn!(
                user_id = %user_id,
                retry_after_secs,
                "Submission rate limit exceeded"
            );
            Err(AppError::RateLimited { retry_after_secs })
        }
    }
}
