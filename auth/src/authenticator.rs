use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::HashingParams;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Holds the only copy of the signing key material; construct it once at
/// startup and share it behind an `Arc`.
#[derive(Debug)]
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// JWT access token
    pub access_token: String,
    /// Claims carried by the token
    pub claims: Claims,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `token_validity` - Lifetime of issued tokens
    ///
    /// # Errors
    /// * `Configuration` - Empty secret or non-positive validity window
    pub fn new(jwt_secret: &[u8], token_validity: Duration) -> Result<Self, AuthenticationError> {
        let jwt_handler = JwtHandler::new(jwt_secret, token_validity)
            .map_err(|e| AuthenticationError::Configuration(e.to_string()))?;

        Ok(Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler,
        })
    }

    /// Use explicit Argon2id costs for new hashes.
    ///
    /// # Errors
    /// * `Configuration` - argon2 rejects the parameter set
    pub fn with_hashing_params(
        mut self,
        params: HashingParams,
    ) -> Result<Self, AuthenticationError> {
        self.password_hasher = PasswordHasher::with_params(params)
            .map_err(|e| AuthenticationError::Configuration(e.to_string()))?;
        Ok(self)
    }

    /// Replace the time source used for token issuance and validation.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.jwt_handler = self.jwt_handler.with_clock(clock);
        self
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Whether a stored hash predates the current hashing parameters.
    pub fn needs_rehash(&self, stored_hash: &str) -> bool {
        self.password_hasher.needs_rehash(stored_hash)
    }

    /// Verify credentials and issue a token bound to `subject`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Identity the token is issued for
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_token(subject)?)
    }

    /// Issue a token without password verification.
    ///
    /// For callers that have already verified the credentials themselves.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(&self, subject: &str) -> Result<AuthenticationResult, JwtError> {
        let issued = self.jwt_handler.issue(subject)?;

        Ok(AuthenticationResult {
            access_token: issued.token,
            claims: issued.claims,
        })
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    /// * `MalformedToken`, `InvalidSignature`, `TokenExpired`
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.jwt_handler.validate(token)
    }
}
