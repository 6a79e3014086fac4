// ABOUTME: HTTP route organization for the auth service
// ABOUTME: Assembles the axum router with the principal-resolution layer and shared state
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod oauth2;

use crate::errors::AppResult;
use crate::middleware::{resolve_principal, AuthenticationResolver};
use crate::oauth2::{AuthorizationFlow, TokenIntrospector};
use crate::store::TokenStore;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Bearer token store
    pub token_store: Arc<TokenStore>,
    /// Authorization-code-with-PKCE flow
    pub flow: Arc<AuthorizationFlow>,
    /// Introspection and revocation operations
    pub introspector: Arc<TokenIntrospector>,
    /// Per-request principal resolver
    pub resolver: Arc<AuthenticationResolver>,
}

/// Build the service router.
///
/// The principal-resolution layer runs before every handler; OAuth2 protocol
/// endpoints ignore the principal, downstream resource routers consume it
/// through the request extension.
pub fn router(state: AppState) -> Router {
    let resolver = state.resolver.clone();
    Router::new()
        .route("/authorize/google", get(oauth2::authorize))
        .route("/callback/google", get(oauth2::callback))
        .route("/token", post(oauth2::token))
        .route("/introspect", post(oauth2::introspect))
        .route("/revoke", post(oauth2::revoke))
        .route("/logout", post(oauth2::logout))
        .route("/health", get(health))
        .layer(axum::middleware::from_fn_with_state(
            resolver,
            resolve_principal,
        ))
        .with_state(state)
}

/// Health check: verifies the token store backend is reachable
async fn health(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    state.token_store.health_check().await?;
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
