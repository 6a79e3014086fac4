// ABOUTME: AEAD sealing for self-contained authorization codes
// ABOUTME: AES-256-GCM with a fresh random nonce per call, nonce-prefixed and base64url encoded
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::{AppError, AppResult};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// Authenticated encryption for outward-facing authorization codes.
///
/// The server holds no state for in-flight codes; the sealed payload *is* the
/// code. Any tampering fails authentication on open and collapses to a single
/// "invalid code" outcome for the caller.
#[derive(Clone)]
pub struct CodeCipher {
    key: [u8; 32],
}

impl CodeCipher {
    /// Create a cipher over a 32-byte key
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Seal `plaintext` into a URL-safe opaque string.
    ///
    /// # Errors
    /// Returns an error if encryption fails.
    pub fn seal(&self, plaintext: &[u8]) -> AppResult<String> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AppError::internal(format!("code encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a sealed string back into its plaintext.
    ///
    /// # Errors
    /// Returns `AUTH_INVALID` for anything that is not a well-formed sealed
    /// payload under this key: bad base64, short input, failed authentication.
    pub fn open(&self, sealed: &str) -> AppResult<Vec<u8>> {
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(sealed)
            .map_err(|_| AppError::auth_invalid("malformed sealed code"))?;

        if bytes.len() < NONCE_LEN {
            return Err(AppError::auth_invalid("sealed code too short"));
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let nonce = GenericArray::from_slice(&bytes[..NONCE_LEN]);
        cipher
            .decrypt(nonce, &bytes[NONCE_LEN..])
            .map_err(|_| AppError::auth_invalid("code authentication failed"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let cipher = CodeCipher::new([3u8; 32]);
        let sealed = cipher.seal(b"payload").unwrap();
        assert_eq!(cipher.open(&sealed).unwrap(), b"payload");
    }

    #[test]
    fn nonces_differ_per_call() {
        let cipher = CodeCipher::new([3u8; 32]);
        assert_ne!(cipher.seal(b"x").unwrap(), cipher.seal(b"x").unwrap());
    }

    #[test]
    fn tampered_code_fails_authentication() {
        let cipher = CodeCipher::new([3u8; 32]);
        let sealed = cipher.seal(b"payload").unwrap();
        let mut bytes = general_purpose::URL_SAFE_NO_PAD.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert!(cipher.open(&tampered).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = CodeCipher::new([3u8; 32]).seal(b"payload").unwrap();
        assert!(CodeCipher::new([4u8; 32]).open(&sealed).is_err());
    }
}
