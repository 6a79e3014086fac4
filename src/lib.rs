// ABOUTME: Authentication and authorization service for the Campus learning platform
// ABOUTME: Opaque bearer tokens with sliding TTL plus an OAuth2 authorization-code-with-PKCE flow
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Campus Auth
//!
//! The authentication and authorization subsystem of the Campus learning
//! platform backend:
//!
//! - **Token store**: opaque bearer-token CRUD with sliding expiration over
//!   an expiring key-value store (Redis in production, in-memory for tests).
//! - **Authorization flow**: RFC 6749 authorization-code grant with RFC 7636
//!   PKCE on both legs, federating login to Google and minting bearer tokens
//!   from encrypted self-contained authorization codes.
//! - **Introspection / revocation**: RFC 7662 and RFC 7009 endpoints over the
//!   same store.
//! - **Middleware**: per-request token resolution attaching an immutable
//!   principal, and scope-based request authorization with an ownership
//!   escape hatch.
//!
//! The entity/relationship layer, GraphQL resolvers and user-profile upsert
//! logic live elsewhere in the platform; this crate consumes the user
//! registry through the [`users::UserDirectory`] trait.

/// Environment-driven configuration
pub mod config;
/// Service-wide constants
pub mod constants;
/// Cryptographic building blocks: tokens, PKCE, sealed codes
pub mod crypto;
/// Unified error handling
pub mod errors;
/// Structured logging setup
pub mod logging;
/// Request middleware
pub mod middleware;
/// Core data models
pub mod models;
/// OAuth2 flow, introspection and revocation
pub mod oauth2;
/// Federated identity providers
pub mod providers;
/// HTTP routes
pub mod routes;
/// Scope-based authorization
pub mod scopes;
/// Security helpers
pub mod security;
/// Bearer token store
pub mod store;
/// User directory collaborator
pub mod users;
