use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    MalformedToken(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Token validity window out of range: {0} seconds")]
    InvalidValidityWindow(i64),
}
