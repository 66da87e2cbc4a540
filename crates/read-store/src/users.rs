//! Lookup of account owners.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AccountId;
use domain::UserIdentity;
use tokio::sync::RwLock;

use crate::Result;

/// Resolves the owner of an account for denormalization into snapshots.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the identity owning the account, or None if unknown.
    async fn find_by_account(&self, account_id: &AccountId) -> Result<Option<UserIdentity>>;
}

/// In-memory user directory.
///
/// Holds explicit account registrations and, optionally, a fallback
/// identity returned for any account without one.
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<AccountId, UserIdentity>>>,
    fallback: Option<UserIdentity>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory that knows no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory answering every unregistered account with `identity`.
    pub fn with_fallback(identity: UserIdentity) -> Self {
        Self {
            users: Arc::default(),
            fallback: Some(identity),
        }
    }

    /// Registers the owner of an account.
    pub async fn register(&self, account_id: impl Into<AccountId>, identity: UserIdentity) {
        self.users.write().await.insert(account_id.into(), identity);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_account(&self, account_id: &AccountId) -> Result<Option<UserIdentity>> {
        let users = self.users.read().await;
        Ok(users.get(account_id).cloned().or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_account_without_fallback() {
        let directory = InMemoryUserDirectory::new();
        let found = directory
            .find_by_account(&AccountId::new("ACC-1"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn registered_account_wins_over_fallback() {
        let directory = InMemoryUserDirectory::with_fallback(UserIdentity::new(1, "test_user"));
        directory
            .register("ACC-2", UserIdentity::new(2, "alice"))
            .await;

        let alice = directory
            .find_by_account(&AccountId::new("ACC-2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.username, "alice");

        let other = directory
            .find_by_account(&AccountId::new("ACC-3"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.username, "test_user");
    }
}
