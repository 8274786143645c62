use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::AuthenticationResult;
use auth::Authenticator;
use auth::Claims;

use crate::domain::credential::errors::AuthError;
use crate::domain::credential::errors::CredentialStoreError;
use crate::domain::credential::models::Identity;
use crate::domain::credential::models::StoredCredential;
use crate::domain::credential::models::Username;
use crate::domain::credential::ports::AuthServicePort;
use crate::domain::credential::ports::CredentialStore;

/// Domain service implementation for registration and login.
///
/// Concrete implementation of AuthServicePort with dependency injection.
/// Password hashing and verification run on the blocking thread pool.
pub struct AuthService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
}

impl<CS> AuthService<CS>
where
    CS: CredentialStore,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `authenticator` - Hasher and token handler built from validated configuration
    ///
    /// # Returns
    /// Configured authentication service instance
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    async fn hash_password(&self, password: &str) -> Result<StoredCredential, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();

        let encoded = tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))??;

        Ok(StoredCredential::new(encoded))
    }

    async fn authenticate(
        &self,
        identity: &Identity,
        password: &str,
    ) -> Result<Result<AuthenticationResult, AuthenticationError>, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();
        let credential = identity.credential.clone();
        let subject = identity.username.to_string();

        tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, credential.expose(), &subject)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))
    }
}

#[async_trait]
impl<CS> AuthServicePort for AuthService<CS>
where
    CS: CredentialStore,
{
    async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = Username::new(username)?;

        if self.store.find_by_username(&username).await?.is_some() {
            tracing::info!(username = %username, "Registration rejected: username already exists");
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let credential = self.hash_password(password).await?;

        match self
            .store
            .insert(Identity::new(username.clone(), credential))
            .await
        {
            Ok(()) => {
                tracing::info!(username = %username, "User registered");
                Ok(())
            }
            Err(CredentialStoreError::DuplicateUsername(existing)) => {
                tracing::info!(
                    username = %existing,
                    "Registration rejected: username taken by a concurrent registration"
                );
                Err(AuthError::DuplicateUsername(existing))
            }
            Err(e) => {
                tracing::error!(username = %username, error = %e, "Failed to store credential");
                Err(e.into())
            }
        }
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, AuthError> {
        let Ok(username) = Username::new(username) else {
            tracing::info!(reason = "malformed_username", "Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(identity) = self.store.find_by_username(&username).await? else {
            // Spend the same hashing effort as a real verification.
            let _ = self.hash_password(password).await;
            tracing::info!(username = %username, reason = "unknown_username", "Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let result = match self.authenticate(&identity, password).await? {
            Ok(result) => result,
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::info!(username = %username, reason = "wrong_password", "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!(username = %username, error = %e, "Failed to issue token");
                return Err(e.into());
            }
        };

        if self.authenticator.needs_rehash(identity.credential.expose()) {
            tracing::debug!(
                username = %username,
                "Stored credential uses outdated hashing parameters"
            );
        }

        tracing::info!(username = %username, expires_at = result.claims.exp, "Login succeeded");

        Ok(result)
    }

    fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.authenticator
            .validate_token(token)
            .map_err(AuthError::from)
    }
}

#[cfg(test)]
mod tests {
    use auth::HashingParams;
    use auth::ManualClock;
    use chrono::DateTime;
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::outbound::repositories::InMemoryCredentialStore;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    // Define mocks in the test module using mockall
    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn find_by_username(
                &self,
                username: &Username,
            ) -> Result<Option<Identity>, CredentialStoreError>;
            async fn insert(&self, identity: Identity) -> Result<(), CredentialStoreError>;
        }
    }

    fn authenticator() -> Authenticator {
        Authenticator::new(SECRET, Duration::days(7))
            .unwrap()
            .with_hashing_params(HashingParams {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap()
    }

    fn identity(username: &str, password: &str) -> Identity {
        let encoded = authenticator().hash_password(password).unwrap();
        Identity::new(
            Username::new(username).unwrap(),
            StoredCredential::new(encoded),
        )
    }

    fn service_with(store: MockTestCredentialStore) -> AuthService<MockTestCredentialStore> {
        AuthService::new(Arc::new(store), Arc::new(authenticator()))
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_insert()
            .withf(|identity| {
                identity.username.as_str() == "alice"
                    && identity.credential.expose().starts_with("$argon2id")
                    && identity.credential.expose() != "pw"
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = service_with(store);

        assert!(service.register("alice", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let mut store = MockTestCredentialStore::new();

        let existing = identity("alice", "pw");
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        store.expect_insert().times(0);

        let service = service_with(store);

        let result = service.register("alice", "pw2").await;
        assert_eq!(
            result.unwrap_err(),
            AuthError::DuplicateUsername("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_detected_by_store() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        store.expect_insert().times(1).returning(|identity| {
            Err(CredentialStoreError::DuplicateUsername(
                identity.username.to_string(),
            ))
        });

        let service = service_with(store);

        let result = service.register("alice", "pw").await;
        assert_eq!(
            result.unwrap_err(),
            AuthError::DuplicateUsername("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_invalid_username() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_username().times(0);
        store.expect_insert().times(0);

        let service = service_with(store);

        let result = service.register("", "pw").await;
        assert!(matches!(result, Err(AuthError::InvalidUsername(_))));
    }

    #[tokio::test]
    async fn test_register_store_failure() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Err(CredentialStoreError::Backend("connection reset".to_string())));
        store.expect_insert().times(0);

        let service = service_with(store);

        let result = service.register("alice", "pw").await;
        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut store = MockTestCredentialStore::new();

        let existing = identity("alice", "pw");
        store
            .expect_find_by_username()
            .withf(|username| username.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        let service = service_with(store);

        let result = service.login("alice", "pw").await.expect("Login failed");
        let claims = service
            .validate_token(&result.access_token)
            .expect("Token validation failed");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut store = MockTestCredentialStore::new();

        let existing = identity("alice", "pw");
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        let service = service_with(store);

        let result = service.login("alice", "wrong").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));

        let service = service_with(store);

        let result = service.login("ghost", "x").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_malformed_username() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_username().times(0);

        let service = service_with(store);

        let result = service.login("", "x").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_malformed_stored_credential() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_username().times(1).returning(|_| {
            Ok(Some(Identity::new(
                Username::new("alice").unwrap(),
                StoredCredential::new("not-a-phc-string".to_string()),
            )))
        });

        let service = service_with(store);

        let result = service.login("alice", "not-a-phc-string").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first_password() {
        let service = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(authenticator()),
        );

        service.register("alice", "pw").await.unwrap();
        assert_eq!(
            service.register("alice", "pw2").await.unwrap_err(),
            AuthError::DuplicateUsername("alice".to_string())
        );

        assert!(service.login("alice", "pw").await.is_ok());
        assert_eq!(
            service.login("alice", "pw2").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let service = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(authenticator()),
        );

        service.register("alice", "pw").await.unwrap();
        service.register("Alice", "other").await.unwrap();

        assert_eq!(
            service.login("ALICE", "pw").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert!(service.login("Alice", "other").await.is_ok());
    }

    #[tokio::test]
    async fn test_token_rejected_after_validity_window() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let service = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(authenticator().with_clock(clock.clone())),
        );

        service.register("alice", "pw").await.unwrap();
        let token = service.login("alice", "pw").await.unwrap().access_token;

        clock.set(start + Duration::days(7));
        assert_eq!(service.validate_token(&token).unwrap().sub, "alice");

        clock.set(start + Duration::days(7) + Duration::seconds(1));
        assert_eq!(
            service.validate_token(&token).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[tokio::test]
    async fn test_login_issuance_failure_is_internal() {
        let mut store = MockTestCredentialStore::new();

        let existing = identity("alice", "pw");
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        // Expiration lands past the last instant chrono can represent.
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::days(1)));
        let service = AuthService::new(
            Arc::new(store),
            Arc::new(authenticator().with_clock(clock)),
        );

        let result = service.login("alice", "pw").await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[tokio::test]
    async fn test_validate_garbage_token() {
        let service = service_with(MockTestCredentialStore::new());

        assert_eq!(
            service.validate_token("not a token").unwrap_err(),
            AuthError::MalformedToken
        );
    }
}
