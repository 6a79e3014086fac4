// ABOUTME: Scope-based request authorization with wildcard and ownership escape hatch
// ABOUTME: Per-operation guards over the principal attached by the auth middleware
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::{AppError, AppResult};
use crate::models::Principal;

/// A principal's granted scopes, checked against `resource:action` strings.
///
/// `"*"` is a universal wildcard satisfying any requirement.
#[derive(Debug, Clone)]
pub struct ScopeSet {
    scopes: Vec<String>,
}

impl ScopeSet {
    /// Build from granted scope strings
    #[must_use]
    pub fn new(scopes: Vec<String>) -> Self {
        Self { scopes }
    }

    /// True when this set satisfies `required`
    #[must_use]
    pub fn satisfies(&self, required: &str) -> bool {
        self.scopes.iter().any(|s| s == "*" || s == required)
    }
}

impl From<&Principal> for ScopeSet {
    fn from(principal: &Principal) -> Self {
        Self::new(principal.record.scopes.clone())
    }
}

/// Per-operation scope enforcement.
///
/// Attached to protected operations with a required `resource:action` string;
/// distinguishes missing authentication (401) from insufficient scope (403).
pub struct ScopeAuthorizer;

impl ScopeAuthorizer {
    /// Require `scope` on the request's principal.
    ///
    /// # Errors
    /// `AUTH_REQUIRED` when no principal is attached; `PERMISSION_DENIED`
    /// when the principal lacks the scope.
    pub fn require(principal: Option<&Principal>, scope: &str) -> AppResult<()> {
        let principal =
            principal.ok_or_else(|| AppError::auth_required("authentication required"))?;
        if ScopeSet::from(principal).satisfies(scope) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "missing required scope {scope}"
            )))
        }
    }

    /// Require `scope`, but let the resource owner through regardless.
    ///
    /// The ownership escape hatch layers on top of scope checking: a read
    /// operation on a user-owned resource passes for the owner even without
    /// the scope.
    ///
    /// # Errors
    /// Same as [`Self::require`] for non-owners.
    pub fn require_or_owner(
        principal: Option<&Principal>,
        scope: &str,
        owner_id: i64,
    ) -> AppResult<()> {
        if let Some(p) = principal {
            if p.user_id() == owner_id {
                return Ok(());
            }
        }
        Self::require(principal, scope)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::TokenRecord;

    fn principal_with(scopes: Vec<&str>) -> Principal {
        Principal {
            token: "t".to_owned(),
            record: TokenRecord::new(
                7,
                "u@campus.example".to_owned(),
                "web".to_owned(),
                scopes.into_iter().map(str::to_owned).collect(),
            ),
        }
    }

    #[test]
    fn wildcard_satisfies_everything() {
        let p = principal_with(vec!["*"]);
        assert!(ScopeAuthorizer::require(Some(&p), "question:write").is_ok());
        assert!(ScopeAuthorizer::require(Some(&p), "user:read").is_ok());
    }

    #[test]
    fn exact_scope_only() {
        let p = principal_with(vec!["user:read"]);
        assert!(ScopeAuthorizer::require(Some(&p), "user:read").is_ok());
        let err = ScopeAuthorizer::require(Some(&p), "user:write").unwrap_err();
        assert_eq!(err.code.http_status(), 403);
    }

    #[test]
    fn missing_principal_is_unauthorized() {
        let err = ScopeAuthorizer::require(None, "user:read").unwrap_err();
        assert_eq!(err.code.http_status(), 401);
    }

    #[test]
    fn owner_bypasses_scope_check() {
        let p = principal_with(vec!["submission:read"]);
        assert!(ScopeAuthorizer::require_or_owner(Some(&p), "user:admin", 7).is_ok());
        assert!(ScopeAuthorizer::require_or_owner(Some(&p), "user:admin", 8).is_err());
    }
}
