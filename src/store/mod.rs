// ABOUTME: Bearer token store with sliding TTL over an expiring key-value backend
// ABOUTME: Defines the KeyValueStore backend trait plus the TokenStore lifecycle operations
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::constants::{SCAN_PAGE_SIZE, TOKEN_KEY_PREFIX};
use crate::crypto::random::generate_token;
use crate::errors::{AppError, AppResult};
use crate::models::{TokenOwner, TokenRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Expiring key-value backend the token store runs against.
///
/// Keys are opaque strings; values are opaque byte documents. Every write
/// attaches a TTL at the store level, so passive expiration needs no
/// cooperation from this service.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key` with expiration `ttl`, replacing any
    /// previous value and TTL
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()>;

    /// Fetch the value under `key`; `None` if absent or expired
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Reset the TTL of `key` to `ttl`; returns false if the key is absent
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Remove `key`; returns false if it did not exist
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// One page of a cursor-based scan over keys matching `pattern`.
    ///
    /// A cursor of 0 starts a scan; a returned cursor of 0 ends it. Pages are
    /// bounded by `count` as a hint, never materializing the full key set.
    async fn scan_page(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> AppResult<(u64, Vec<String>)>;

    /// Remaining TTL of `key`; `None` if absent, expired, or persistent
    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> AppResult<()>;
}

/// Opaque bearer-token CRUD with sliding expiration.
///
/// Tokens are cryptographically random URL-safe strings used purely as lookup
/// keys; the JSON-encoded [`TokenRecord`] lives under `auth:token:<TOKEN>`
/// with a store-level TTL. The TTL default is threaded in explicitly so tests
/// can shrink it per instance.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl TokenStore {
    /// Create a store over `backend` with the given sliding TTL
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// The configured sliding TTL
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.ttl
    }

    /// Backend reachability check for the health endpoint
    ///
    /// # Errors
    /// Returns a storage error when the backend is unreachable.
    pub async fn health_check(&self) -> AppResult<()> {
        self.backend.health_check().await
    }

    fn token_key(token: &str) -> String {
        format!("{TOKEN_KEY_PREFIX}{token}")
    }

    /// Mint a fresh token for `record` and store it with the full TTL.
    ///
    /// # Errors
    /// Fails only on RNG, serialization, or backend transport errors.
    pub async fn create(&self, record: &TokenRecord) -> AppResult<String> {
        let token = generate_token()?;
        let value = serde_json::to_vec(record)
            .map_err(|e| AppError::internal(format!("token record serialization failed: {e}")))?;
        self.backend
            .set_ex(&Self::token_key(&token), &value, self.ttl)
            .await?;
        debug!(user_id = record.user_id, machine = %record.machine, "bearer token created");
        Ok(token)
    }

    /// Resolve `token` and reset its TTL to the full default (sliding session).
    ///
    /// # Errors
    /// `RESOURCE_NOT_FOUND` when the token is absent or expired; storage
    /// errors propagate unchanged.
    pub async fn get(&self, token: &str) -> AppResult<TokenRecord> {
        let key = Self::token_key(token);
        let record = self.read(&key).await?;
        // Refresh is idempotent (same absolute TTL), so concurrent gets
        // against the same token never need a compare-and-swap.
        if !self.backend.expire(&key, self.ttl).await? {
            // Expired between read and refresh; treat as absent.
            return Err(AppError::not_found("token not found"));
        }
        Ok(record)
    }

    /// Resolve `token` without touching its TTL.
    ///
    /// Introspection uses this so a read-only inquiry never silently extends
    /// a session.
    ///
    /// # Errors
    /// `RESOURCE_NOT_FOUND` when the token is absent or expired.
    pub async fn peek(&self, token: &str) -> AppResult<TokenRecord> {
        self.read(&Self::token_key(token)).await
    }

    /// Remaining TTL of `token`, for tests and diagnostics
    ///
    /// # Errors
    /// Propagates backend transport errors.
    pub async fn remaining_ttl(&self, token: &str) -> AppResult<Option<Duration>> {
        self.backend.ttl(&Self::token_key(token)).await
    }

    /// Remove `token`.
    ///
    /// # Errors
    /// `RESOURCE_NOT_FOUND` if it never existed; revocation callers treat
    /// that as a successful no-op per RFC 7009.
    pub async fn delete(&self, token: &str) -> AppResult<()> {
        if self.backend.delete(&Self::token_key(token)).await? {
            Ok(())
        } else {
            Err(AppError::not_found("token not found"))
        }
    }

    /// Remove every token belonging to `user_id`; returns the number removed.
    ///
    /// Full cursor-based iteration over `auth:token:*` in bounded pages,
    /// parsing only the `user_id` field of each candidate before deciding.
    /// Per-step memory stays O(1) and total work O(n) in live tokens. A
    /// user→tokens index was rejected: this operation is a rare logout-all,
    /// and an index would need its own consistency discipline against
    /// create/delete races. A token created for the target user during the
    /// scan may survive if the cursor already passed it; accepted.
    ///
    /// # Errors
    /// Propagates backend transport errors; the scan stops at the first one.
    pub async fn delete_by_user(&self, user_id: i64) -> AppResult<u64> {
        let pattern = format!("{TOKEN_KEY_PREFIX}*");
        let mut cursor = 0u64;
        let mut deleted = 0u64;

        loop {
            let (next_cursor, keys) = self
                .backend
                .scan_page(cursor, &pattern, SCAN_PAGE_SIZE)
                .await?;

            for key in keys {
                let Some(value) = self.backend.get(&key).await? else {
                    // Expired between scan and read.
                    continue;
                };
                match serde_json::from_slice::<TokenOwner>(&value) {
                    Ok(owner) if owner.user_id == user_id => {
                        if self.backend.delete(&key).await? {
                            deleted += 1;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(%key, "skipping unparseable token record during bulk revocation: {e}");
                    }
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(user_id, deleted, "bulk token revocation finished");
        Ok(deleted)
    }

    async fn read(&self, key: &str) -> AppResult<TokenRecord> {
        let value = self
            .backend
            .get(key)
            .await?
            .ok_or_else(|| AppError::not_found("token not found"))?;
        serde_json::from_slice(&value)
            .map_err(|e| AppError::internal(format!("token record deserialization failed: {e}")))
    }
}
