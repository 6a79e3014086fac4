// ABOUTME: Cryptographic building blocks for tokens, PKCE and authorization codes
// ABOUTME: Random generation, S256 challenge derivation and AEAD code sealing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod codes;
pub mod pkce;
pub mod random;

pub use codes::CodeCipher;
