use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::credential::errors::UsernameError;

/// Registered identity.
///
/// Pairs a username with the stored credential derived from its password.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: Username,
    pub credential: StoredCredential,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(username: Username, credential: StoredCredential) -> Self {
        Self {
            username,
            credential,
            created_at: Utc::now(),
        }
    }
}

/// Username value type
///
/// Case-sensitive and compared byte for byte. Must be non-empty and at most
/// 64 bytes long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MAX_LENGTH: usize = 64;

    /// Create a new valid username.
    ///
    /// # Arguments
    /// * `username` - Raw username string
    ///
    /// # Returns
    /// Validated Username value object
    ///
    /// # Errors
    /// * `Empty` - Username is the empty string
    /// * `TooLong` - Username longer than 64 bytes
    pub fn new(username: impl Into<String>) -> Result<Self, UsernameError> {
        let username = username.into();
        let length = username.len();

        if length == 0 {
            Err(UsernameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(username))
        }
    }

    /// Get username as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Encoded one-way password credential (PHC string).
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential(String);

impl StoredCredential {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    /// Encoded form, for persistence and verification only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoredCredential(<redacted>)")
    }
}
