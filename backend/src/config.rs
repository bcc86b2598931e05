use std::env;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_audience: String,
    pub auth_url: Option<String>,
    pub auth_anon_key: Option<String>,

    pub webhook_url: String,
    pub webhook_secret: Option<String>,
    pub webhook_timeout_secs: u64,
    pub webhook_retries: u32,

    pub submit_rate_limit: u32,
    pub submit_rate_window_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: optional("DATABASE_URL"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: optional("CORS_EXTRA_ORIGINS")
                .map(|raw| comma_list(&raw))
                .unwrap_or_default(),

            jwt_secret: env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET must be set")?,
            jwt_audience: env::var("AUTH_JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".into()),
            auth_url: optional("AUTH_URL").map(|u| u.trim_end_matches('/').to_string()),
            auth_anon_key: optional("AUTH_ANON_KEY"),

            webhook_url: env::var("RECOMMENDATION_WEBHOOK_URL")
                .context("RECOMMENDATION_WEBHOOK_URL must be set")?,
            webhook_secret: optional("RECOMMENDATION_WEBHOOK_SECRET"),
            webhook_timeout_secs: parsed("WEBHOOK_TIMEOUT_SECS", 15)?,
            webhook_retries: parsed("WEBHOOK_RETRIES", 1)?,

            submit_rate_limit: parsed("SUBMIT_RATE_LIMIT", 10)?,
            submit_rate_window_secs: parsed("SUBMIT_RATE_WINDOW_SECS", 60)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Unset and empty are treated the same.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}
