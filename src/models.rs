// ABOUTME: Core data models for bearer token records and request principals
// ABOUTME: Mirrors the auth:token:<TOKEN> JSON storage layout and its validation invariant
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stored document backing an opaque bearer token.
///
/// The token string itself carries no claims; everything a request needs to
/// know about its principal lives here, keyed under `auth:token:<TOKEN>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Owning user id, always positive for a well-formed record
    pub user_id: i64,
    /// Owning user's email address
    pub user_email: String,
    /// Name of the machine or flow that minted this token
    pub machine: String,
    /// Granted scopes as `resource:action` strings; `"*"` grants everything
    pub scopes: Vec<String>,
    /// Free-form metadata (flow markers, impersonation markers)
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl TokenRecord {
    /// Create a record with empty metadata
    #[must_use]
    pub fn new(user_id: i64, user_email: String, machine: String, scopes: Vec<String>) -> Self {
        Self {
            user_id,
            user_email,
            machine,
            scopes,
            meta: HashMap::new(),
        }
    }

    /// Structural invariant for records reconstructed from storage.
    ///
    /// A record failing this check is treated as corrupt; the middleware
    /// revokes the backing token rather than serving the record.
    ///
    /// # Errors
    /// Returns `AUTH_INVALID` naming the first violated field.
    pub fn validate(&self) -> AppResult<()> {
        if self.user_id <= 0 {
            return Err(AppError::auth_invalid("token record has non-positive user_id"));
        }
        if self.user_email.is_empty() {
            return Err(AppError::auth_invalid("token record has empty user_email"));
        }
        if self.machine.is_empty() {
            return Err(AppError::auth_invalid("token record has empty machine"));
        }
        if self.scopes.is_empty() {
            return Err(AppError::auth_invalid("token record has no scopes"));
        }
        Ok(())
    }
}

/// Projection of a stored record carrying only the owner field.
///
/// `delete_by_user` deserializes candidates into this type so a full scan
/// never materializes whole documents it is not going to keep.
#[derive(Debug, Deserialize)]
pub struct TokenOwner {
    /// Owning user id
    pub user_id: i64,
}

/// Resolved identity attached to a request after successful authentication.
///
/// Immutable once attached; downstream consumers read it through the
/// request-extension accessor and never mutate it.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The bearer token the principal was resolved from
    pub token: String,
    /// The validated token record
    pub record: TokenRecord,
}

impl Principal {
    /// Owning user id shortcut
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.record.user_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_record() -> TokenRecord {
        TokenRecord::new(
            42,
            "student@campus.example".to_owned(),
            "web".to_owned(),
            vec!["user:read".to_owned()],
        )
    }

    #[test]
    fn valid_record_passes() {
        assert!(valid_record().validate().is_ok());
    }

    #[test]
    fn zero_user_id_is_corrupt() {
        let mut record = valid_record();
        record.user_id = 0;
        let err = record.validate().unwrap_err();
        assert!(err.message.contains("user_id"));
    }

    #[test]
    fn empty_scopes_are_corrupt() {
        let mut record = valid_record();
        record.scopes.clear();
        assert!(record.validate().is_err());
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = valid_record();
        let bytes = serde_json::to_vec(&record).unwrap();
        let back: TokenRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn owner_projection_reads_only_user_id() {
        let record = valid_record();
        let bytes = serde_json::to_vec(&record).unwrap();
        let owner: TokenOwner = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(owner.user_id, 42);
    }
}
