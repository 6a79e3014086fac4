// ABOUTME: OAuth2 request/response structures and RFC 6749/7009/7662 error vocabulary
// ABOUTME: Includes the self-contained encrypted authorization code payload
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth2 authorization request (GET /authorize/google)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeParams {
    /// Response type; only `code` is supported
    pub response_type: Option<String>,
    /// Client redirect URI, checked against the allow-list
    pub redirect_uri: Option<String>,
    /// Client CSRF state, echoed back unchanged
    pub state: Option<String>,
    /// Client PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// Client PKCE challenge method; must be `S256`
    pub code_challenge_method: Option<String>,
}

/// Identity provider callback parameters (GET /callback/google)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Provider authorization code
    pub code: Option<String>,
    /// Passthrough client state
    pub state: Option<String>,
}

/// OAuth2 token request (POST /token, form-encoded)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Grant type; must be `authorization_code`
    pub grant_type: Option<String>,
    /// The sealed authorization code
    pub code: Option<String>,
    /// Client redirect URI; must equal the value embedded in the code
    pub redirect_uri: Option<String>,
    /// Client PKCE verifier for the outer exchange
    pub code_verifier: Option<String>,
}

/// OAuth2 token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Token type (always "Bearer")
    pub token_type: String,
    /// The opaque bearer token
    pub access_token: String,
    /// Seconds until expiration (sliding; reset on each authenticated read)
    pub expires_in: u64,
}

/// Introspection / revocation request (RFC 7662 / RFC 7009, form-encoded)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntrospectRequest {
    /// The token under inquiry
    pub token: Option<String>,
    /// Optional hint; only `access_token` is supported
    pub token_type_hint: Option<String>,
}

/// Impersonation actor claim (RFC 8693 `act`)
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActClaim {
    /// Impersonating user id
    pub sub: String,
}

/// Introspection response (RFC 7662).
///
/// Inactive responses carry `active:false` and nothing else, uniformly for
/// never-issued, expired, revoked and orphaned tokens.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active
    pub active: bool,
    /// Owning user's email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Space-joined granted scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Owning user id as a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration time (unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued-at time (unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Authorized party: the machine or flow that minted the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Impersonation actor, when the token was minted by an impersonating admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub act: Option<ActClaim>,
}

impl IntrospectionResponse {
    /// The uniform inactive response
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            username: None,
            scope: None,
            sub: None,
            exp: None,
            iat: None,
            azp: None,
            act: None,
        }
    }
}

/// Self-contained authorization code payload.
///
/// Never persisted server-side: serialized, authenticated-encrypted and
/// handed to the client as the `code` parameter. Single use is approximated
/// by the 10-minute expiry, not enforced by a used-code ledger.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizationCodePayload {
    /// Authenticated platform user
    pub user_id: i64,
    /// The client's original redirect URI, binding the code to its session
    pub redirect_uri: String,
    /// The client's PKCE code challenge for the outer exchange
    pub code_challenge: String,
    /// Client CSRF state
    pub state: String,
    /// Hard expiry; any exchange after this instant is `invalid_grant`
    pub expires_at: DateTime<Utc>,
}

/// OAuth2 error response (RFC 6749 §5.2 vocabulary)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuth2Error {
    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }

    /// Create an `unsupported_grant_type` error
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self {
            error: "unsupported_grant_type".to_owned(),
            error_description: Some("Grant type not supported".to_owned()),
        }
    }

    /// Create an `unsupported_token_type` error (RFC 7009 §2.2.1)
    #[must_use]
    pub fn unsupported_token_type(description: &str) -> Self {
        Self {
            error: "unsupported_token_type".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }

    /// Create a `server_error`, hiding internal detail from the client
    #[must_use]
    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_owned(),
            error_description: Some("Internal server error".to_owned()),
        }
    }

    /// HTTP status for this protocol error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        if self.error == "server_error" {
            500
        } else {
            400
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        let status = axum::http::StatusCode::from_u16(self.http_status())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
