// ABOUTME: OAuth2 authorization-code-with-PKCE state machine: authorize, callback, token
// ABOUTME: Federates login to an identity provider and mints opaque bearer tokens on exchange
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::models::{
    AuthorizationCodePayload, AuthorizeParams, CallbackParams, OAuth2Error, TokenRequest,
    TokenResponse,
};
use crate::config::OAuth2Config;
use crate::constants::{
    AUTH_CODE_TTL_MINUTES, CHALLENGE_COOKIE, FLOW_COOKIE_MAX_AGE_SECS, META_INITIATE_FROM_FLOW,
    REDIRECT_COOKIE, VERIFIER_COOKIE,
};
use crate::crypto::{pkce, CodeCipher};
use crate::errors::AppError;
use crate::models::TokenRecord;
use crate::providers::IdentityProvider;
use crate::security::cookies::{clear_cookie, flow_cookie, get_cookie_value};
use crate::store::TokenStore;
use crate::users::UserDirectory;
use axum::http::HeaderMap;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Outcome of the authorize and callback transitions.
///
/// Both variants carry any Set-Cookie values the handler must attach. A
/// `Reject` is a JSON 400, used only when no redirect URI has been verified
/// yet - the server cannot safely bounce to an unverified URI - and still
/// clears any flow cookies already issued.
#[derive(Debug)]
pub enum FlowOutcome {
    /// 302 to `location` with the given Set-Cookie headers
    Redirect {
        /// Target URL
        location: String,
        /// Set-Cookie header values
        cookies: Vec<String>,
    },
    /// Synchronous JSON protocol error
    Reject {
        /// The protocol error body
        error: OAuth2Error,
        /// Set-Cookie header values (flow cookie clears)
        cookies: Vec<String>,
    },
}

/// RFC 6749 authorization-code grant with RFC 7636 PKCE on both legs.
///
/// The client-facing PKCE instance binds the outward code to the requesting
/// client; a second, server-generated instance protects the upstream exchange
/// with the identity provider. Between `authorize` and `callback` the server
/// holds no state other than client-held cookies.
pub struct AuthorizationFlow {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserDirectory>,
    token_store: Arc<TokenStore>,
    codes: CodeCipher,
    callback_path: String,
    redirect_allow_list: Vec<String>,
}

impl AuthorizationFlow {
    /// Assemble the flow from its collaborators
    #[must_use]
    pub fn new(
        config: &OAuth2Config,
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserDirectory>,
        token_store: Arc<TokenStore>,
    ) -> Self {
        Self {
            provider,
            users,
            token_store,
            codes: CodeCipher::new(config.code_key),
            callback_path: "/callback/google".to_owned(),
            redirect_allow_list: config.redirect_allow_list.clone(),
        }
    }

    /// Handle the authorization request.
    ///
    /// The redirect URI is verified against the allow-list first; a mismatch
    /// is a JSON `invalid_request`. Every later validation failure uses the
    /// RFC 6749 error channel: a redirect back to the now-trusted client URI
    /// with `error`, `error_description` and `state` query parameters.
    pub fn authorize(&self, params: &AuthorizeParams) -> FlowOutcome {
        let Some(redirect_uri) = params.redirect_uri.as_deref().filter(|s| !s.is_empty()) else {
            return FlowOutcome::Reject {
                error: OAuth2Error::invalid_request("redirect_uri is required"),
                cookies: Vec::new(),
            };
        };
        if !self.is_allowed_redirect(redirect_uri) {
            warn!("authorize rejected: redirect_uri not in allow-list");
            return FlowOutcome::Reject {
                error: OAuth2Error::invalid_request("redirect_uri is not registered"),
                cookies: Vec::new(),
            };
        }

        let state = params.state.as_deref();

        if params.response_type.as_deref() != Some("code") {
            return Self::error_redirect(
                redirect_uri,
                state,
                &OAuth2Error::invalid_request("Only 'code' response_type is supported"),
            );
        }

        let Some(code_challenge) = params.code_challenge.as_deref().filter(|s| !s.is_empty())
        else {
            return Self::error_redirect(
                redirect_uri,
                state,
                &OAuth2Error::invalid_request(
                    "code_challenge is required for authorization_code flow (PKCE)",
                ),
            );
        };
        if params.code_challenge_method.as_deref() != Some("S256") {
            return Self::error_redirect(
                redirect_uri,
                state,
                &OAuth2Error::invalid_request("code_challenge_method must be 'S256'"),
            );
        }

        // Fresh PKCE instance for the upstream leg; its verifier rides in a
        // short-lived cookie until the provider calls back.
        let internal_verifier = match pkce::generate_verifier() {
            Ok(v) => v,
            Err(e) => {
                warn!("failed to generate internal PKCE verifier: {e}");
                return Self::error_redirect(redirect_uri, state, &OAuth2Error::server_error());
            }
        };
        let internal_challenge = pkce::challenge_s256(&internal_verifier);

        let cookies = vec![
            flow_cookie(
                VERIFIER_COOKIE,
                &internal_verifier,
                &self.callback_path,
                FLOW_COOKIE_MAX_AGE_SECS,
            ),
            flow_cookie(
                REDIRECT_COOKIE,
                &urlencoding::encode(redirect_uri),
                &self.callback_path,
                FLOW_COOKIE_MAX_AGE_SECS,
            ),
            flow_cookie(
                CHALLENGE_COOKIE,
                code_challenge,
                &self.callback_path,
                FLOW_COOKIE_MAX_AGE_SECS,
            ),
        ];

        debug!("authorize accepted, redirecting to identity provider");
        FlowOutcome::Redirect {
            location: self
                .provider
                .authorization_url(state.unwrap_or_default(), &internal_challenge),
            cookies,
        }
    }

    /// Handle the identity provider's callback.
    ///
    /// Recovers the internal verifier and stashed client parameters from the
    /// flow cookies, completes the upstream exchange, upserts the user, seals
    /// the authorization code and bounces back to the client. All flow
    /// cookies are cleared unconditionally once consumed.
    pub async fn callback(&self, params: &CallbackParams, headers: &HeaderMap) -> FlowOutcome {
        let clearing = self.clearing_cookies();
        let state = params.state.as_deref();

        let client_redirect = get_cookie_value(headers, REDIRECT_COOKIE)
            .and_then(|v| urlencoding::decode(&v).map(|s| s.into_owned()).ok());
        let Some(client_redirect) = client_redirect else {
            // No trusted redirect URI to bounce to; still clear whatever flow
            // cookies survived.
            return FlowOutcome::Reject {
                error: OAuth2Error::invalid_request(
                    "authorization flow cookies are missing or expired",
                ),
                cookies: clearing,
            };
        };

        let Some(internal_verifier) = get_cookie_value(headers, VERIFIER_COOKIE) else {
            return Self::error_redirect_with_cookies(
                &client_redirect,
                state,
                &OAuth2Error::invalid_request("PKCE verifier cookie is missing or expired"),
                clearing,
            );
        };
        let Some(client_challenge) = get_cookie_value(headers, CHALLENGE_COOKIE) else {
            return Self::error_redirect_with_cookies(
                &client_redirect,
                state,
                &OAuth2Error::invalid_request("code challenge cookie is missing or expired"),
                clearing,
            );
        };
        let Some(provider_code) = params.code.as_deref().filter(|s| !s.is_empty()) else {
            return Self::error_redirect_with_cookies(
                &client_redirect,
                state,
                &OAuth2Error::invalid_request("identity provider returned no code"),
                clearing,
            );
        };

        let user = match self
            .federated_login(provider_code, &internal_verifier)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                warn!("federated login failed: {e}");
                return Self::error_redirect_with_cookies(
                    &client_redirect,
                    state,
                    &OAuth2Error::server_error(),
                    clearing,
                );
            }
        };

        let payload = AuthorizationCodePayload {
            user_id: user.id,
            redirect_uri: client_redirect.clone(),
            code_challenge: client_challenge,
            state: state.unwrap_or_default().to_owned(),
            expires_at: Utc::now() + ChronoDuration::minutes(AUTH_CODE_TTL_MINUTES),
        };
        let code = match self.seal_payload(&payload) {
            Ok(code) => code,
            Err(e) => {
                warn!("failed to seal authorization code: {e}");
                return Self::error_redirect_with_cookies(
                    &client_redirect,
                    state,
                    &OAuth2Error::server_error(),
                    clearing,
                );
            }
        };

        let mut location = client_redirect;
        let mut query: Vec<(&str, &str)> = vec![("code", &code)];
        if let Some(state) = state {
            query.push(("state", state));
        }
        Self::append_query(&mut location, &query);
        debug!(user_id = user.id, "callback complete, returning code to client");
        FlowOutcome::Redirect {
            location,
            cookies: clearing,
        }
    }

    /// Handle the token exchange.
    ///
    /// # Errors
    /// Returns the RFC 6749 protocol error for every failure mode: missing
    /// parameters (`invalid_request`), a grant type other than
    /// `authorization_code` (`unsupported_grant_type`), and any code
    /// decryption, expiry, redirect binding or PKCE failure
    /// (`invalid_grant`).
    pub async fn token(&self, request: &TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        if request.grant_type.as_deref() != Some("authorization_code") {
            return Err(OAuth2Error::unsupported_grant_type());
        }
        let code = request
            .code
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("code is required"))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("redirect_uri is required"))?;
        let code_verifier = request
            .code_verifier
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("code_verifier is required"))?;

        let payload = self.open_payload(code)?;

        if Utc::now() > payload.expires_at {
            return Err(OAuth2Error::invalid_grant("authorization code has expired"));
        }
        // Binds the code to the same client session that initiated it.
        if redirect_uri != payload.redirect_uri {
            return Err(OAuth2Error::invalid_grant(
                "redirect_uri does not match the authorization request",
            ));
        }
        if !pkce::is_valid_verifier(code_verifier) {
            return Err(OAuth2Error::invalid_grant(
                "code_verifier must be 43-128 characters from the unreserved set",
            ));
        }
        if !pkce::verify_s256(code_verifier, &payload.code_challenge) {
            warn!("PKCE verification failed - code_verifier does not match code_challenge");
            return Err(OAuth2Error::invalid_grant("Invalid code_verifier"));
        }

        let user = self
            .users
            .find_by_id(payload.user_id)
            .await
            .map_err(|e| {
                warn!("user lookup failed during token exchange: {e}");
                OAuth2Error::server_error()
            })?
            .ok_or_else(|| OAuth2Error::invalid_grant("unknown user"))?;

        if user.scopes.is_empty() {
            warn!(user_id = user.id, "refusing to mint a token with no scopes");
            return Err(OAuth2Error::server_error());
        }

        let mut record = TokenRecord::new(user.id, user.email, "oauth2".to_owned(), user.scopes);
        record
            .meta
            .insert(META_INITIATE_FROM_FLOW.to_owned(), "oauth2".to_owned());

        let access_token = self.token_store.create(&record).await.map_err(|e| {
            warn!("token mint failed: {e}");
            OAuth2Error::server_error()
        })?;

        Ok(TokenResponse {
            token_type: "Bearer".to_owned(),
            access_token,
            expires_in: self.token_store.token_ttl().as_secs(),
        })
    }

    /// Seal an authorization code payload; exposed for tests crafting
    /// expired codes
    ///
    /// # Errors
    /// Propagates serialization and encryption failures.
    pub fn seal_payload(&self, payload: &AuthorizationCodePayload) -> Result<String, AppError> {
        let bytes = serde_json::to_vec(payload)
            .map_err(|e| AppError::internal(format!("code payload serialization failed: {e}")))?;
        self.codes.seal(&bytes)
    }

    fn open_payload(&self, code: &str) -> Result<AuthorizationCodePayload, OAuth2Error> {
        let bytes = self
            .codes
            .open(code)
            .map_err(|_| OAuth2Error::invalid_grant("Invalid or expired authorization code"))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| OAuth2Error::invalid_grant("Invalid or expired authorization code"))
    }

    /// Exact match on scheme+host+path; query and fragment are ignored
    fn is_allowed_redirect(&self, redirect_uri: &str) -> bool {
        let Ok(candidate) = Url::parse(redirect_uri) else {
            return false;
        };
        self.redirect_allow_list.iter().any(|allowed| {
            Url::parse(allowed).is_ok_and(|allowed| {
                allowed.scheme() == candidate.scheme()
                    && allowed.host_str() == candidate.host_str()
                    && allowed.port_or_known_default() == candidate.port_or_known_default()
                    && allowed.path() == candidate.path()
            })
        })
    }

    fn clearing_cookies(&self) -> Vec<String> {
        vec![
            clear_cookie(VERIFIER_COOKIE, &self.callback_path),
            clear_cookie(REDIRECT_COOKIE, &self.callback_path),
            clear_cookie(CHALLENGE_COOKIE, &self.callback_path),
        ]
    }

    async fn federated_login(
        &self,
        provider_code: &str,
        internal_verifier: &str,
    ) -> Result<crate::users::DirectoryUser, AppError> {
        let provider_token = self
            .provider
            .exchange_code(provider_code, internal_verifier)
            .await?;
        let profile = self
            .provider
            .fetch_profile(&provider_token.access_token)
            .await?;
        self.users.get_or_register(&profile).await
    }

    fn error_redirect(redirect_uri: &str, state: Option<&str>, error: &OAuth2Error) -> FlowOutcome {
        Self::error_redirect_with_cookies(redirect_uri, state, error, Vec::new())
    }

    /// `state` is echoed only when the client sent one (RFC 6749 §4.1.2.1)
    fn error_redirect_with_cookies(
        redirect_uri: &str,
        state: Option<&str>,
        error: &OAuth2Error,
        cookies: Vec<String>,
    ) -> FlowOutcome {
        let description = error.error_description.as_deref().unwrap_or_default();
        let mut location = redirect_uri.to_owned();
        let mut query: Vec<(&str, &str)> = vec![
            ("error", &error.error),
            ("error_description", description),
        ];
        if let Some(state) = state {
            query.push(("state", state));
        }
        Self::append_query(&mut location, &query);
        FlowOutcome::Redirect {
            location,
            cookies,
        }
    }

    fn append_query(location: &mut String, params: &[(&str, &str)]) {
        if let Ok(mut url) = Url::parse(location) {
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    pairs.append_pair(key, value);
                }
            }
            *location = url.into();
        }
    }
}
