use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::credential::errors::CredentialStoreError;
use crate::domain::credential::models::Identity;
use crate::domain::credential::models::Username;
use crate::domain::credential::ports::CredentialStore;

/// Process-local credential store.
///
/// Check and insert happen under one write lock, so concurrent
/// registrations of the same username resolve to exactly one winner.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    identities: RwLock<HashMap<Username, Identity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Identity>, CredentialStoreError> {
        Ok(self.identities.read().await.get(username).cloned())
    }

    async fn insert(&self, identity: Identity) -> Result<(), CredentialStoreError> {
        let mut identities = self.identities.write().await;

        if identities.contains_key(&identity.username) {
            return Err(CredentialStoreError::DuplicateUsername(
                identity.username.to_string(),
            ));
        }

        identities.insert(identity.username.clone(), identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::credential::models::StoredCredential;

    fn identity(username: &str) -> Identity {
        Identity::new(
            Username::new(username).unwrap(),
            StoredCredential::new(format!("$argon2id$fake${}", username)),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryCredentialStore::new();

        store.insert(identity("alice")).await.unwrap();

        let found = store
            .find_by_username(&Username::new("alice").unwrap())
            .await
            .unwrap()
            .expect("alice should be stored");
        assert_eq!(found.username.as_str(), "alice");

        let missing = store
            .find_by_username(&Username::new("bob").unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryCredentialStore::new();

        store.insert(identity("alice")).await.unwrap();
        let result = store.insert(identity("alice")).await;

        assert_eq!(
            result,
            Err(CredentialStoreError::DuplicateUsername("alice".to_string()))
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_have_one_winner() {
        let store = Arc::new(InMemoryCredentialStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(identity("alice")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.len().await, 1);
    }
}
