// ABOUTME: Server binary wiring config, Redis store, Google provider and routes together
// ABOUTME: Serves the OAuth2 and token lifecycle endpoints over HTTP
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::{Context, Result};
use campus_auth::config::{AuthConfig, OAuth2Config, ServerConfig, StoreConfig};
use campus_auth::logging::{self, LoggingConfig};
use campus_auth::middleware::AuthenticationResolver;
use campus_auth::oauth2::{AuthorizationFlow, TokenIntrospector};
use campus_auth::providers::GoogleProvider;
use campus_auth::routes::{router, AppState};
use campus_auth::store::{RedisStore, TokenStore};
use campus_auth::users::InMemoryDirectory;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(&LoggingConfig::from_env())?;

    let server_config = ServerConfig::from_env();
    let store_config = StoreConfig::from_env();
    let auth_config = AuthConfig::from_env();
    let oauth2_config = OAuth2Config::from_env().context("OAuth2 configuration")?;

    let backend = Arc::new(RedisStore::connect(&store_config).await?);
    let token_store = Arc::new(TokenStore::new(backend, auth_config.token_ttl));

    // The platform's entity layer normally implements UserDirectory; the
    // standalone binary runs against the in-memory directory.
    let users = Arc::new(InMemoryDirectory::new(vec!["user:read".to_owned()]));
    let provider = Arc::new(GoogleProvider::new(&oauth2_config));

    let flow = Arc::new(AuthorizationFlow::new(
        &oauth2_config,
        provider,
        users.clone(),
        token_store.clone(),
    ));
    let introspector = Arc::new(TokenIntrospector::new(token_store.clone(), users));
    let resolver = Arc::new(AuthenticationResolver::new(token_store.clone()));

    let state = AppState {
        token_store,
        flow,
        introspector,
        resolver,
    };

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("campus-auth listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
