use thiserror::Error;

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username must not be empty")]
    Empty,

    #[error("Username too long: maximum {max} bytes, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error reported by a credential store adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialStoreError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Credential store error: {0}")]
    Backend(String),
}

/// Top-level error for registration, login and token validation.
///
/// `InvalidCredentials` covers both an unknown username and a wrong
/// password; the two are only told apart in logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CredentialStoreError> for AuthError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::DuplicateUsername(username) => {
                AuthError::DuplicateUsername(username)
            }
            CredentialStoreError::Backend(message) => AuthError::Storage(message),
        }
    }
}

impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::MalformedToken(_) => AuthError::MalformedToken,
            auth::JwtError::InvalidSignature => AuthError::InvalidSignature,
            auth::JwtError::TokenExpired => AuthError::TokenExpired,
            auth::JwtError::InvalidKey(_) | auth::JwtError::InvalidValidityWindow(_) => {
                AuthError::Configuration(err.to_string())
            }
            auth::JwtError::EncodingFailed(_) => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<auth::AuthenticationError> for AuthError {
    fn from(err: auth::AuthenticationError) -> Self {
        match err {
            auth::AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
            auth::AuthenticationError::Configuration(message) => AuthError::Configuration(message),
            auth::AuthenticationError::PasswordError(e) => AuthError::Internal(e.to_string()),
            auth::AuthenticationError::JwtError(e) => e.into(),
        }
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
