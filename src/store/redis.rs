// ABOUTME: Redis key-value backend with connection pooling and TTL support
// ABOUTME: Uses ConnectionManager with retry/backoff connect, SETEX, EXPIRE and cursor SCAN
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::KeyValueStore;
use crate::config::StoreConfig;
use crate::errors::{AppError, AppResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{error, info, warn};

/// Redis backend for the token store.
///
/// Uses Redis `ConnectionManager` for automatic reconnection and connection
/// pooling. TTLs ride on the keys themselves (SETEX/EXPIRE), so expiration
/// needs no sweeper in this process.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis per `config`.
    ///
    /// # Errors
    /// Returns a storage error when the client cannot be created or every
    /// connection attempt fails.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        info!(
            "Connecting to Redis at {} (timeout={}s, response_timeout={}s, retries={})",
            config.redis_url,
            config.connection_timeout_secs,
            config.response_timeout_secs,
            config.initial_connection_retries
        );

        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| AppError::storage(format!("Failed to create Redis client: {e}")))?;

        let manager = Self::connect_with_retry(&client, config).await?;

        info!("Successfully connected to Redis");
        Ok(Self { manager })
    }

    /// Connect with exponential backoff retry on failure
    async fn connect_with_retry(
        client: &redis::Client,
        config: &StoreConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(config.response_timeout_secs))
            .set_max_delay(config.max_retry_delay_ms);

        let max_retries = config.initial_connection_retries;
        let mut delay_ms = config.initial_retry_delay_ms;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            last_error
                                .as_ref()
                                .map_or_else(|| "unknown".to_owned(), ToString::to_string)
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(config.max_retry_delay_ms);
                    }
                }
            }
        }

        Err(AppError::storage(format!(
            "Failed to connect to Redis after {} attempts: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        let mut conn = self.manager.clone();
        // SETEX writes value and expiration in one atomic operation
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| {
                error!("Redis SETEX failed: {}", e);
                AppError::storage(format!("store error: {e}"))
            })?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(|e| {
            error!("Redis GET failed: {}", e);
            AppError::storage(format!("store error: {e}"))
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AppError::storage("TTL out of range for Redis EXPIRE"))?;
        conn.expire(key, ttl_secs).await.map_err(|e| {
            error!("Redis EXPIRE failed: {}", e);
            AppError::storage(format!("store error: {e}"))
        })
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        let removed: u64 = conn.del(key).await.map_err(|e| {
            error!("Redis DEL failed: {}", e);
            AppError::storage(format!("store error: {e}"))
        })?;
        Ok(removed > 0)
    }

    async fn scan_page(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> AppResult<(u64, Vec<String>)> {
        let mut conn = self.manager.clone();
        redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis SCAN failed: {}", e);
                AppError::storage(format!("store error: {e}"))
            })
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        let mut conn = self.manager.clone();
        let ttl_secs: i64 = conn.ttl(key).await.map_err(|e| {
            error!("Redis TTL failed: {}", e);
            AppError::storage(format!("store error: {e}"))
        })?;

        // Redis returns -2 if the key doesn't exist, -1 if it has no expiration
        match ttl_secs {
            secs if secs > 0 => Ok(Some(Duration::from_secs(secs as u64))),
            _ => Ok(None),
        }
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis PING failed: {}", e);
                AppError::storage(format!("store error: {e}"))
            })?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(AppError::storage(format!(
                "unexpected PING response '{response}'"
            )))
        }
    }
}
