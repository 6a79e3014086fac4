// ABOUTME: Shared test harness: in-memory store, stub identity provider, seeded user directory
// ABOUTME: Builds the flow, introspector and resolver against short TTLs for fast tests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use campus_auth::config::OAuth2Config;
use campus_auth::errors::{AppError, AppResult};
use campus_auth::middleware::AuthenticationResolver;
use campus_auth::models::TokenRecord;
use campus_auth::oauth2::{AuthorizationFlow, TokenIntrospector};
use campus_auth::providers::{IdentityProvider, ProviderToken};
use campus_auth::routes::AppState;
use campus_auth::store::{MemoryStore, TokenStore};
use campus_auth::users::{FederatedProfile, InMemoryDirectory, UserDirectory as _};
use std::sync::Arc;
use std::time::Duration;

/// Redirect URI registered in the test allow-list
pub const REDIRECT_URI: &str = "https://app.campus.example/auth/callback";

/// Provider code the stub accepts
pub const PROVIDER_CODE: &str = "provider-code";

/// Email the stub provider reports for every login
pub const FEDERATED_EMAIL: &str = "student@campus.example";

/// Identity provider stub: accepts one fixed code, returns one fixed profile
pub struct StubProvider;

#[async_trait::async_trait]
impl IdentityProvider for StubProvider {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "https://idp.example/auth?state={}&code_challenge={}",
            urlencoding::encode(state),
            urlencoding::encode(code_challenge)
        )
    }

    async fn exchange_code(&self, code: &str, _code_verifier: &str) -> AppResult<ProviderToken> {
        if code == PROVIDER_CODE {
            Ok(ProviderToken {
                access_token: "provider-access".to_owned(),
            })
        } else {
            Err(AppError::external_service("stub", "unknown provider code"))
        }
    }

    async fn fetch_profile(&self, _access_token: &str) -> AppResult<FederatedProfile> {
        Ok(FederatedProfile {
            email: FEDERATED_EMAIL.to_owned(),
            name: Some("Student".to_owned()),
            avatar_url: None,
        })
    }
}

pub struct TestHarness {
    pub backend: Arc<MemoryStore>,
    pub token_store: Arc<TokenStore>,
    pub users: Arc<InMemoryDirectory>,
    pub flow: Arc<AuthorizationFlow>,
    pub introspector: Arc<TokenIntrospector>,
    pub resolver: Arc<AuthenticationResolver>,
}

impl TestHarness {
    pub fn app_state(&self) -> AppState {
        AppState {
            token_store: self.token_store.clone(),
            flow: self.flow.clone(),
            introspector: self.introspector.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

pub fn test_oauth2_config() -> OAuth2Config {
    OAuth2Config {
        client_id: "test-client".to_owned(),
        client_secret: "test-secret".to_owned(),
        auth_endpoint: "https://idp.example/auth".to_owned(),
        token_endpoint: "https://idp.example/token".to_owned(),
        userinfo_endpoint: "https://idp.example/userinfo".to_owned(),
        public_base_url: "http://localhost:8081".to_owned(),
        redirect_allow_list: vec![REDIRECT_URI.to_owned()],
        code_key: [7u8; 32],
    }
}

pub fn harness_with_ttl(ttl: Duration) -> TestHarness {
    let backend = Arc::new(MemoryStore::new());
    let token_store = Arc::new(TokenStore::new(backend.clone(), ttl));
    let users = Arc::new(InMemoryDirectory::new(vec![
        "user:read".to_owned(),
        "submission:read".to_owned(),
    ]));
    let flow = Arc::new(AuthorizationFlow::new(
        &test_oauth2_config(),
        Arc::new(StubProvider),
        users.clone(),
        token_store.clone(),
    ));
    let introspector = Arc::new(TokenIntrospector::new(token_store.clone(), users.clone()));
    let resolver = Arc::new(AuthenticationResolver::new(token_store.clone()));
    TestHarness {
        backend,
        token_store,
        users,
        flow,
        introspector,
        resolver,
    }
}

pub fn harness() -> TestHarness {
    harness_with_ttl(Duration::from_secs(60))
}

pub fn record_for(user_id: i64) -> TokenRecord {
    TokenRecord::new(
        user_id,
        format!("user{user_id}@campus.example"),
        "web".to_owned(),
        vec!["user:read".to_owned()],
    )
}

/// Seed a directory user so introspection can confirm the owner exists
pub async fn seed_user(harness: &TestHarness, user_id: i64) {
    harness.users.seed(
        user_id,
        &format!("user{user_id}@campus.example"),
        vec!["user:read".to_owned()],
    );
    // Sanity: the seeded user is resolvable
    assert!(harness
        .users
        .find_by_id(user_id)
        .await
        .unwrap()
        .is_some());
}
