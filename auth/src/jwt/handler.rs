use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;
use crate::clock::Clock;
use crate::clock::SystemClock;

/// A freshly signed access token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Longest accepted token lifetime, in days.
pub const MAX_VALIDITY_DAYS: i64 = 3650;

/// JWT token handler: issues and validates access tokens.
///
/// Uses HS256 (HMAC with SHA-256). Expiry is checked against the injected
/// clock with no leeway, after the signature has been verified.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    validity: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JwtHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtHandler")
            .field("algorithm", &self.algorithm)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    /// * `validity` - Lifetime of every issued token
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm and the system clock
    ///
    /// # Errors
    /// * `InvalidKey` - Secret is empty
    /// * `InvalidValidityWindow` - Validity is not positive or exceeds [`MAX_VALIDITY_DAYS`]
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], validity: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("secret must be non-empty".to_string()));
        }
        Self::check_validity(validity)?;

        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        // Expiry is compared against our own clock in `validate`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
            validity,
            clock: Arc::new(SystemClock),
        })
    }

    /// Check that a token lifetime is usable for issuance.
    ///
    /// # Errors
    /// * `InvalidValidityWindow` - Validity is not positive or exceeds [`MAX_VALIDITY_DAYS`]
    pub fn check_validity(validity: Duration) -> Result<(), JwtError> {
        if validity <= Duration::zero() || validity > Duration::days(MAX_VALIDITY_DAYS) {
            return Err(JwtError::InvalidValidityWindow(validity.num_seconds()));
        }

        Ok(())
    }

    /// Replace the time source used for issuance and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a signed token bound to `subject`.
    ///
    /// # Arguments
    /// * `subject` - Identity to bind (the username)
    ///
    /// # Returns
    /// Signed token and its claims
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed or the expiration is unrepresentable
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, JwtError> {
        let claims = Claims::for_subject(subject, self.clock.now(), self.validity)?;
        let token = self.encode(&claims)?;

        Ok(IssuedToken { token, claims })
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate a token and return its claims.
    ///
    /// # Arguments
    /// * `token` - JWT token string to validate
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `MalformedToken` - Token cannot be parsed or lacks required claims
    /// * `InvalidSignature` - Signature does not match the claims
    /// * `TokenExpired` - Expiration time is in the past
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;

        let claims = token_data.claims;
        if claims.is_expired(self.clock.now().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}

/// Maps jsonwebtoken errors to our JwtError type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::MalformedToken(error.to_string()),
    }
}
