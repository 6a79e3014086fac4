// ABOUTME: RFC 7662 token introspection and RFC 7009 token revocation
// ABOUTME: Read-only inquiry via peek (no TTL slide) and idempotent revocation over the store
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::models::{ActClaim, IntrospectRequest, IntrospectionResponse, OAuth2Error};
use crate::constants::META_IMPERSONATOR_ID;
use crate::store::TokenStore;
use crate::users::UserDirectory;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Thin introspection and revocation operations over the token store.
///
/// Both endpoints never distinguish "never existed" from "revoked" from
/// "owner deleted": every inactive case collapses to the same
/// `{active:false}` body to avoid information leakage.
pub struct TokenIntrospector {
    store: Arc<TokenStore>,
    users: Arc<dyn UserDirectory>,
}

impl TokenIntrospector {
    /// Build over the shared store and user directory
    #[must_use]
    pub fn new(store: Arc<TokenStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Introspect a token (RFC 7662).
    ///
    /// Uses `peek` so a read-only inquiry never silently extends a session.
    /// `exp` and `iat` are reconstructed from now plus the default TTL; the
    /// store does not expose the original issuance time.
    ///
    /// # Errors
    /// `invalid_request` for a missing token, `unsupported_token_type` for a
    /// hint other than `access_token`, `server_error` for storage failures.
    pub async fn introspect(
        &self,
        request: &IntrospectRequest,
    ) -> Result<IntrospectionResponse, OAuth2Error> {
        let token = Self::required_token(request)?;

        let record = match self.store.peek(token).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return Ok(IntrospectionResponse::inactive()),
            Err(e) => {
                warn!("storage failure during introspection: {e}");
                return Err(OAuth2Error::server_error());
            }
        };

        // A dangling token whose owner was deleted is indistinguishable from
        // an unknown one.
        let owner = match self.users.find_by_id(record.user_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => return Ok(IntrospectionResponse::inactive()),
            Err(e) => {
                warn!("user lookup failure during introspection: {e}");
                return Err(OAuth2Error::server_error());
            }
        };

        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(self.store.token_ttl().as_secs()).unwrap_or(i64::MAX);
        let act = record
            .meta
            .get(META_IMPERSONATOR_ID)
            .map(|sub| ActClaim { sub: sub.clone() });

        debug!(user_id = owner.id, "introspection: token active");
        Ok(IntrospectionResponse {
            active: true,
            username: Some(record.user_email),
            scope: Some(record.scopes.join(" ")),
            sub: Some(record.user_id.to_string()),
            exp: Some(now + ttl_secs),
            iat: Some(now),
            azp: Some(record.machine),
            act,
        })
    }

    /// Revoke a token (RFC 7009).
    ///
    /// Revoking a token that does not exist is a successful no-op; the caller
    /// cannot probe for token existence through this endpoint.
    ///
    /// # Errors
    /// `invalid_request` for a missing token, `unsupported_token_type` for a
    /// bad hint, `server_error` only for genuine storage failures.
    pub async fn revoke(&self, request: &IntrospectRequest) -> Result<(), OAuth2Error> {
        let token = Self::required_token(request)?;

        match self.store.delete(token).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                warn!("storage failure during revocation: {e}");
                Err(OAuth2Error::server_error())
            }
        }
    }

    fn required_token(request: &IntrospectRequest) -> Result<&str, OAuth2Error> {
        if let Some(hint) = request.token_type_hint.as_deref() {
            if hint != "access_token" {
                return Err(OAuth2Error::unsupported_token_type(
                    "only access_token is supported",
                ));
            }
        }
        request
            .token
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("token is required"))
    }
}
