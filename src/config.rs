use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Keys and models for the meal-suggestion providers. A provider without a
/// key is left out of the chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn gemini_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub cron_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match non_empty_var("APP_PORT").or_else(|| non_empty_var("PORT")) {
            Some(p) => p.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 4000,
        };
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "aidiet".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "aidiet-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let ai = AiConfig {
            gemini_api_key: non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("GOOGLE_API_KEY")),
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            timeout_secs: std::env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        Ok(Self {
            host,
            port,
            database_url,
            jwt,
            ai,
            cron_secret: non_empty_var("CRON_SECRET"),
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
