//! Authentication utilities library
//!
//! Provides the credential and access-token primitives used by the identity service:
//! - Password hashing (Argon2id, self-describing PHC strings)
//! - HS256 access-token issuance and validation with an injectable clock
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::JwtHandler;
//! use chrono::Duration;
//!
//! let secret = b"secret_key_at_least_32_bytes_long!";
//! let handler = JwtHandler::new(secret, Duration::days(7)).unwrap();
//! let issued = handler.issue("alice").unwrap();
//! let claims = handler.validate(&issued.token).unwrap();
//! assert_eq!(claims.sub, "alice");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//! use chrono::Duration;
//!
//! let secret = b"secret_key_at_least_32_bytes_long!";
//! let auth = Authenticator::new(secret, Duration::days(7)).unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! let result = auth.authenticate("password123", &hash, "alice").unwrap();
//!
//! // Validate token
//! let claims = auth.validate_token(&result.access_token).unwrap();
//! assert_eq!(claims.sub, "alice");
//! ```

pub mod authenticator;
pub mod clock;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::MAX_VALIDITY_DAYS;
pub use password::HashingParams;
pub use password::PasswordError;
pub use password::PasswordHasher;
