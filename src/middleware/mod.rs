// ABOUTME: Request middleware for the auth service
// ABOUTME: Principal resolution runs once per inbound request before resource logic
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod auth;

pub use auth::{principal_from, resolve_principal, AuthenticationResolver};
