use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Access token claims.
///
/// Only the registered claims the service relies on: who the token is for
/// and the window in which it is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for a subject valid from `issued_at` for `validity`.
    ///
    /// # Arguments
    /// * `subject` - Identity the token is bound to
    /// * `issued_at` - Issuance instant
    /// * `validity` - How long the token stays valid
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiration falls outside the representable range
    pub fn for_subject(
        subject: impl ToString,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, JwtError> {
        let expiration = issued_at.checked_add_signed(validity).ok_or_else(|| {
            JwtError::EncodingFailed(format!(
                "expiration overflows {} + {}s",
                issued_at,
                validity.num_seconds()
            ))
        })?;

        Ok(Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        })
    }

    /// Expiration as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
