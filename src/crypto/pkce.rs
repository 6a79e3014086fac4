// ABOUTME: PKCE (RFC 7636) verifier generation and S256 challenge verification
// ABOUTME: Constant-time challenge comparison to defeat timing probes on code exchange
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::crypto::random::generate_random_string;
use crate::errors::AppResult;
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a fresh PKCE verifier (43 characters, 256 bits of entropy).
///
/// # Errors
/// Propagates RNG failure.
pub fn generate_verifier() -> AppResult<String> {
    generate_random_string(32)
}

/// Derive the S256 challenge for `verifier`: `BASE64URL(SHA256(verifier))`
#[must_use]
pub fn challenge_s256(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Verifier format check per RFC 7636 Section 4.1: 43-128 characters from
/// the unreserved set `[A-Za-z0-9\-._~]`
#[must_use]
pub fn is_valid_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier
            .chars()
            .all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~'))
}

/// Verify `verifier` against a stored S256 `challenge` in constant time
#[must_use]
pub fn verify_s256(verifier: &str, challenge: &str) -> bool {
    let computed = challenge_s256(verifier);
    computed.as_bytes().ct_eq(challenge.as_bytes()).into()
}
