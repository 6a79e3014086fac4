// ABOUTME: Federated identity provider abstraction and implementations
// ABOUTME: The flow depends only on the trait; Google is the shipped implementation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod google;

pub use google::GoogleProvider;

use crate::errors::AppResult;
use crate::users::FederatedProfile;

/// Access token returned by the upstream provider's token endpoint
#[derive(Debug, Clone)]
pub struct ProviderToken {
    /// Bearer token for the provider's APIs
    pub access_token: String,
}

/// Upstream identity provider contract for the federated login leg.
///
/// The inner PKCE instance (this server ↔ provider) lives behind this trait;
/// it is distinct from, and chained to, the client-facing PKCE instance.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider's authorization URL carrying our internal S256
    /// challenge and the client's passthrough state
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String;

    /// Exchange the provider's authorization code using the internal verifier
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<ProviderToken>;

    /// Fetch the federated user profile with a provider access token
    async fn fetch_profile(&self, access_token: &str) -> AppResult<FederatedProfile>;
}
