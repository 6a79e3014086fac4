// ABOUTME: Service-wide constants for key namespaces, cookies and defaults
// ABOUTME: Centralizes literal values shared between the store, flow and routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// Storage key namespace for bearer token records
pub const TOKEN_KEY_PREFIX: &str = "auth:token:";

/// SCAN page size for bulk token iteration
pub const SCAN_PAGE_SIZE: usize = 100;

/// Default bearer token TTL in seconds (8 hours, sliding)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 8 * 60 * 60;

/// Authorization code lifetime in minutes
pub const AUTH_CODE_TTL_MINUTES: i64 = 10;

/// Flow cookie lifetime in seconds (verifier, redirect echo, challenge)
pub const FLOW_COOKIE_MAX_AGE_SECS: u64 = 5 * 60;

/// Session cookie carrying the bearer token for web clients
pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Flow cookie holding the internal PKCE verifier for the upstream exchange
pub const VERIFIER_COOKIE: &str = "oauth_verifier";

/// Flow cookie echoing the client's redirect URI between authorize and callback
pub const REDIRECT_COOKIE: &str = "oauth_redirect";

/// Flow cookie holding the client's PKCE code challenge
pub const CHALLENGE_COOKIE: &str = "oauth_challenge";

/// Metadata key recording which flow minted a token
pub const META_INITIATE_FROM_FLOW: &str = "initiate_from_flow";

/// Metadata key carrying the impersonating admin's user id, when present
pub const META_IMPERSONATOR_ID: &str = "impersonator_id";

/// Default service port
pub const DEFAULT_HTTP_PORT: u16 = 8081;
