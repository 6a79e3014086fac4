// ABOUTME: Secure random string generation for bearer tokens and PKCE verifiers
// ABOUTME: System RNG output encoded as URL-safe base64 without padding
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Generate a URL-safe random string from `length` bytes of system entropy.
///
/// # Errors
/// Returns an error if the system RNG fails - a critical security failure;
/// the server cannot operate securely without working RNG.
pub fn generate_random_string(length: usize) -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; length];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!(
            "CRITICAL: SystemRandom failed - cannot generate secure random bytes: {}",
            e
        );
        AppError::internal("System RNG failure - server cannot operate securely")
    })?;

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&bytes))
}

/// Generate an opaque bearer token: 32 bytes (256 bits) of entropy.
///
/// # Errors
/// Propagates RNG failure.
pub fn generate_token() -> AppResult<String> {
    generate_random_string(32)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_long_enough() {
        let token = generate_token().unwrap();
        // 32 bytes base64url without padding is 43 characters
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token().unwrap(), generate_token().unwrap());
    }
}
