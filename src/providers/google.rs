// ABOUTME: Google OAuth2 provider client for the federated login leg
// ABOUTME: Form-encoded code exchange with inner PKCE plus OpenID userinfo fetch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::{IdentityProvider, ProviderToken};
use crate::config::OAuth2Config;
use crate::errors::{AppError, AppResult};
use crate::users::FederatedProfile;
use serde::Deserialize;

/// Google OAuth2 provider
pub struct GoogleProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    callback_uri: String,
}

/// Google token response format
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

/// Google userinfo response format
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl GoogleProvider {
    /// Build from flow configuration
    #[must_use]
    pub fn new(config: &OAuth2Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_endpoint: config.auth_endpoint.clone(),
            token_endpoint: config.token_endpoint.clone(),
            userinfo_endpoint: config.userinfo_endpoint.clone(),
            callback_uri: config.callback_uri(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.auth_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<ProviderToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.callback_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::external_service("google", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Google token exchange rejected with status {}", status);
            return Err(AppError::external_service(
                "google",
                format!("token exchange failed with status {status}"),
            ));
        }

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service("google", format!("parse error: {e}")))?;

        Ok(ProviderToken {
            access_token: token.access_token,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> AppResult<FederatedProfile> {
        let response = self
            .client
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::external_service("google", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                "google",
                format!("userinfo fetch failed with status {}", response.status()),
            ));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| AppError::external_service("google", format!("parse error: {e}")))?;

        Ok(FederatedProfile {
            email: info.email,
            name: info.name,
            avatar_url: info.picture,
        })
    }
}
