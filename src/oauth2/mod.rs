// ABOUTME: OAuth2 authorization server subsystem
// ABOUTME: Authorization-code-with-PKCE flow, token exchange, introspection and revocation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod flow;
pub mod introspection;
pub mod models;

pub use flow::AuthorizationFlow;
pub use introspection::TokenIntrospector;
