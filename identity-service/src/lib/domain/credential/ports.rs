use async_trait::async_trait;

use crate::domain::credential::errors::AuthError;
use crate::domain::credential::errors::CredentialStoreError;
use crate::domain::credential::models::Identity;
use crate::domain::credential::models::Username;

/// Port for the authentication operations callers rely on.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new identity.
    ///
    /// # Arguments
    /// * `username` - Desired username (case-sensitive)
    /// * `password` - Plaintext password, hashed before storage
    ///
    /// # Returns
    /// Unit on success; no token is issued
    ///
    /// # Errors
    /// * `InvalidUsername` - Username is empty or too long
    /// * `DuplicateUsername` - Username is already taken
    /// * `Storage` - Credential store failed
    async fn register(&self, username: &str, password: &str) -> Result<(), AuthError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Arguments
    /// * `username` - Username to authenticate
    /// * `password` - Plaintext password to verify
    ///
    /// # Returns
    /// Signed access token and its claims
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown username or wrong password
    /// * `Storage` - Credential store failed
    async fn login(&self, username: &str, password: &str)
        -> Result<auth::AuthenticationResult, AuthError>;

    /// Validate a bearer token presented with a request.
    ///
    /// # Arguments
    /// * `token` - Opaque token string, without transport framing
    ///
    /// # Returns
    /// Claims identifying the subject
    ///
    /// # Errors
    /// * `MalformedToken` - Token cannot be parsed
    /// * `InvalidSignature` - Signature does not match
    /// * `TokenExpired` - Token is past its expiry
    fn validate_token(&self, token: &str) -> Result<auth::Claims, AuthError>;
}

/// Persistence operations for stored credentials.
///
/// Implementations must hold at most one record per username and reject a
/// second insert for the same username atomically.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve the identity registered under a username.
    ///
    /// # Arguments
    /// * `username` - Username to search for
    ///
    /// # Returns
    /// Optional identity (None if not registered)
    ///
    /// # Errors
    /// * `Backend` - Storage operation failed
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Identity>, CredentialStoreError>;

    /// Persist a new identity.
    ///
    /// # Arguments
    /// * `identity` - Identity to store
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `DuplicateUsername` - Username is already taken
    /// * `Backend` - Storage operation failed
    async fn insert(&self, identity: Identity) -> Result<(), CredentialStoreError>;
}
