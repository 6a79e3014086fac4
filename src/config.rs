// ABOUTME: Environment-driven configuration for server, store, auth and OAuth2 flow
// ABOUTME: Every tunable is an explicit value threaded into constructors, never a process global
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::constants;
use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose, Engine as _};
use std::env;
use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl ServerConfig {
    /// Load from `HOST` / `PORT` with localhost defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", constants::DEFAULT_HTTP_PORT),
        }
    }
}

/// Key-value store (Redis) connection configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Initial connection timeout
    pub connection_timeout_secs: u64,
    /// Per-command response timeout
    pub response_timeout_secs: u64,
    /// Retries for the initial connection
    pub initial_connection_retries: u32,
    /// First retry delay in milliseconds (doubles up to the cap)
    pub initial_retry_delay_ms: u64,
    /// Retry delay cap in milliseconds
    pub max_retry_delay_ms: u64,
}

impl StoreConfig {
    /// Load from `REDIS_URL` and timeout overrides
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            connection_timeout_secs: env_parse("REDIS_CONNECTION_TIMEOUT_SECS", 5),
            response_timeout_secs: env_parse("REDIS_RESPONSE_TIMEOUT_SECS", 2),
            initial_connection_retries: env_parse("REDIS_CONNECTION_RETRIES", 3),
            initial_retry_delay_ms: env_parse("REDIS_RETRY_DELAY_MS", 200),
            max_retry_delay_ms: env_parse("REDIS_MAX_RETRY_DELAY_MS", 5_000),
        }
    }
}

/// Bearer token lifecycle configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Sliding token TTL; reset to this full value on every authenticated read
    pub token_ttl: Duration,
}

impl AuthConfig {
    /// Load from `TOKEN_TTL_SECS` (default 8 hours)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            token_ttl: Duration::from_secs(env_parse(
                "TOKEN_TTL_SECS",
                constants::DEFAULT_TOKEN_TTL_SECS,
            )),
        }
    }
}

/// OAuth2 authorization-code flow configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Upstream identity provider client id
    pub client_id: String,
    /// Upstream identity provider client secret
    pub client_secret: String,
    /// Upstream authorization endpoint
    pub auth_endpoint: String,
    /// Upstream token endpoint
    pub token_endpoint: String,
    /// Upstream userinfo endpoint
    pub userinfo_endpoint: String,
    /// Public base URL of this service, used to derive the callback URI
    pub public_base_url: String,
    /// Exact-match allow-list for client redirect URIs (scheme+host+path)
    pub redirect_allow_list: Vec<String>,
    /// 32-byte AEAD key sealing outward authorization codes
    pub code_key: [u8; 32],
}

impl OAuth2Config {
    /// Load from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
    /// `OAUTH_REDIRECT_ALLOW_LIST` (comma-separated) and
    /// `AUTH_CODE_KEY` (base64, 32 bytes decoded).
    ///
    /// # Errors
    /// Returns `CONFIG_ERROR` when required variables are missing or the code
    /// key does not decode to exactly 32 bytes.
    pub fn from_env() -> AppResult<Self> {
        let client_id = env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| AppError::config("GOOGLE_CLIENT_ID not set"))?;
        let client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| AppError::config("GOOGLE_CLIENT_SECRET not set"))?;

        let redirect_allow_list: Vec<String> = env::var("OAUTH_REDIRECT_ALLOW_LIST")
            .map_err(|_| AppError::config("OAUTH_REDIRECT_ALLOW_LIST not set"))?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if redirect_allow_list.is_empty() {
            return Err(AppError::config("OAUTH_REDIRECT_ALLOW_LIST is empty"));
        }

        let code_key = Self::decode_code_key(
            &env::var("AUTH_CODE_KEY").map_err(|_| AppError::config("AUTH_CODE_KEY not set"))?,
        )?;

        Ok(Self {
            client_id,
            client_secret,
            auth_endpoint: env_or(
                "GOOGLE_AUTH_ENDPOINT",
                "https://accounts.google.com/o/oauth2/v2/auth",
            ),
            token_endpoint: env_or("GOOGLE_TOKEN_ENDPOINT", "https://oauth2.googleapis.com/token"),
            userinfo_endpoint: env_or(
                "GOOGLE_USERINFO_ENDPOINT",
                "https://openidconnect.googleapis.com/v1/userinfo",
            ),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8081"),
            redirect_allow_list,
            code_key,
        })
    }

    /// This service's callback URI registered with the upstream provider
    #[must_use]
    pub fn callback_uri(&self) -> String {
        format!("{}/callback/google", self.public_base_url)
    }

    fn decode_code_key(encoded: &str) -> AppResult<[u8; 32]> {
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::config(format!("AUTH_CODE_KEY is not valid base64: {e}")))?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| AppError::config(format!("AUTH_CODE_KEY must decode to 32 bytes, got {len}")))
    }
}
