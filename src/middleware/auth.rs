// ABOUTME: Per-request bearer token resolution and principal injection
// ABOUTME: Cookie or Authorization header extraction with soft-failure semantics for expired tokens
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::constants::AUTH_TOKEN_COOKIE;
use crate::errors::{AppError, AppResult};
use crate::models::Principal;
use crate::security::cookies::get_cookie_value;
use crate::store::TokenStore;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the request principal from a bearer token.
///
/// Failure semantics, in order of severity:
/// - no token at all: anonymous, the request proceeds;
/// - unknown or expired token: also anonymous (soft failure) - an expired
///   session degrades rather than rejecting the request outright;
/// - malformed `Authorization` value: hard format error;
/// - token resolves but the stored record fails validation: the token is
///   revoked on the spot and the request is rejected - a corrupt record must
///   not poison a session indefinitely.
#[derive(Clone)]
pub struct AuthenticationResolver {
    store: Arc<TokenStore>,
}

impl AuthenticationResolver {
    /// Create a resolver over the shared token store
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// Resolve the principal for a request, if any.
    ///
    /// The session cookie takes precedence; the `Authorization` header is
    /// consulted only when no cookie is present.
    ///
    /// # Errors
    /// `AUTH_MALFORMED` for a non-Bearer Authorization value, `AUTH_INVALID`
    /// for a corrupt stored record (revoked as a side effect), storage errors
    /// unchanged.
    pub async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<Principal>> {
        let Some(token) = Self::extract_token(headers)? else {
            return Ok(None);
        };

        let record = match self.store.get(&token).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                debug!("bearer token unknown or expired, proceeding anonymously");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if let Err(validation) = record.validate() {
            warn!(
                user_id = record.user_id,
                "revoking token with corrupt record: {}", validation.message
            );
            match self.store.delete(&token).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            return Err(AppError::auth_invalid(validation.message));
        }

        Ok(Some(Principal { token, record }))
    }

    fn extract_token(headers: &HeaderMap) -> AppResult<Option<String>> {
        if let Some(token) = get_cookie_value(headers, AUTH_TOKEN_COOKIE) {
            return Ok(Some(token));
        }

        let Some(header) = headers.get("authorization") else {
            return Ok(None);
        };
        let value = header
            .to_str()
            .map_err(|_| AppError::auth_malformed("Authorization header is not valid UTF-8"))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::auth_malformed("Invalid authorization header format - must be 'Bearer <token>'")
        })?;
        if token.is_empty() {
            return Err(AppError::auth_malformed("Bearer token is empty"));
        }
        Ok(Some(token.to_owned()))
    }
}

/// axum middleware attaching the resolved principal as a request extension.
///
/// The principal is immutable once attached; downstream consumers read it
/// through [`principal_from`].
///
/// # Errors
/// Rejects the request for malformed credentials or corrupt records; absent
/// and expired tokens pass through anonymously.
pub async fn resolve_principal(
    State(resolver): State<Arc<AuthenticationResolver>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(principal) = resolver.resolve(request.headers()).await? {
        request.extensions_mut().insert(principal);
    }
    Ok(next.run(request).await)
}

/// Typed accessor for the request principal: present/absent, never a panic
#[must_use]
pub fn principal_from(extensions: &axum::http::Extensions) -> Option<&Principal> {
    extensions.get::<Principal>()
}
