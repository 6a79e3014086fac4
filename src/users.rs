// ABOUTME: User directory collaborator consumed as a black box by the auth flow
// ABOUTME: Get-or-register by federated email plus lookups for token minting and introspection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppResult;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// Profile returned by the federated identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedProfile {
    /// Verified email address, the upsert key
    pub email: String,
    /// Display name, refreshed on every login
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL, refreshed on every login
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Directory view of a platform user
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    /// Platform user id, always positive
    pub id: i64,
    /// Email address
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Aggregated scope set granted to this user
    pub scopes: Vec<String>,
}

/// Black-box user registry the flow delegates to.
///
/// The real platform implements this over its entity layer; this crate only
/// depends on the contract. Upsert semantics (refreshing name/avatar) belong
/// to the implementor.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find the user for a federated profile, registering it on first login
    async fn get_or_register(&self, profile: &FederatedProfile) -> AppResult<DirectoryUser>;

    /// Look up a user by id; `None` when the user has been deleted
    async fn find_by_id(&self, user_id: i64) -> AppResult<Option<DirectoryUser>>;
}

/// In-memory directory for tests and single-node development
#[derive(Default)]
pub struct InMemoryDirectory {
    users: DashMap<i64, DirectoryUser>,
    next_id: AtomicI64,
    default_scopes: Vec<String>,
}

impl InMemoryDirectory {
    /// Create a directory granting `default_scopes` to newly registered users
    #[must_use]
    pub fn new(default_scopes: Vec<String>) -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
            default_scopes,
        }
    }

    /// Seed a user with explicit id and scopes; returns the id
    pub fn seed(&self, id: i64, email: &str, scopes: Vec<String>) -> i64 {
        self.users.insert(
            id,
            DirectoryUser {
                id,
                email: email.to_owned(),
                name: None,
                scopes,
            },
        );
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        id
    }

    /// Remove a user, leaving any of their tokens dangling
    pub fn remove(&self, id: i64) {
        self.users.remove(&id);
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_or_register(&self, profile: &FederatedProfile) -> AppResult<DirectoryUser> {
        // Clone the match out in its own statement so the iterator's shard
        // guard is released before the insert below takes a write lock.
        let existing = self.users.iter().find_map(|entry| {
            (entry.value().email == profile.email).then(|| entry.value().clone())
        });
        if let Some(mut user) = existing {
            // Refresh display name on every login
            user.name.clone_from(&profile.name);
            self.users.insert(user.id, user.clone());
            return Ok(user);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = DirectoryUser {
            id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            scopes: self.default_scopes.clone(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: i64) -> AppResult<Option<DirectoryUser>> {
        Ok(self.users.get(&user_id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_login_reuses_the_same_id() {
        let dir = InMemoryDirectory::new(vec!["user:read".to_owned()]);
        let profile = FederatedProfile {
            email: "a@campus.example".to_owned(),
            name: Some("A".to_owned()),
            avatar_url: None,
        };
        let first = dir.get_or_register(&profile).await.unwrap();
        let second = dir.get_or_register(&profile).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.scopes, vec!["user:read".to_owned()]);
    }

    #[tokio::test]
    async fn repeat_logins_terminate_and_refresh_the_display_name() {
        let dir = InMemoryDirectory::new(vec!["user:read".to_owned()]);
        let mut profile = FederatedProfile {
            email: "c@campus.example".to_owned(),
            name: Some("Before".to_owned()),
            avatar_url: None,
        };
        let first = dir.get_or_register(&profile).await.unwrap();

        profile.name = Some("After".to_owned());
        let second = dir.get_or_register(&profile).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("After"));
        assert_eq!(
            dir.find_by_id(first.id).await.unwrap().unwrap().name.as_deref(),
            Some("After")
        );
    }

    #[tokio::test]
    async fn removed_user_is_gone() {
        let dir = InMemoryDirectory::new(vec![]);
        let id = dir.seed(9, "b@campus.example", vec!["*".to_owned()]);
        dir.remove(id);
        assert!(dir.find_by_id(id).await.unwrap().is_none());
    }
}
