use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Argon2id cost parameters.
///
/// Raising these only affects newly hashed credentials: every stored hash
/// carries the parameters it was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl HashingParams {
    /// Check that argon2 accepts this parameter set.
    ///
    /// # Errors
    /// * `InvalidParams` - Memory, iteration or parallelism cost out of range
    pub fn validate(&self) -> Result<(), PasswordError> {
        self.to_argon2_params().map(|_| ())
    }

    fn to_argon2_params(self) -> Result<Params, PasswordError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hashing implementation.
///
/// Provides cryptographic password hashing (internally uses Argon2id).
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a password hasher with explicit cost parameters.
    ///
    /// # Arguments
    /// * `params` - Argon2id memory, iteration and parallelism costs
    ///
    /// # Errors
    /// * `InvalidParams` - argon2 rejects the parameter set
    pub fn with_params(params: HashingParams) -> Result<Self, PasswordError> {
        Ok(Self {
            params: params.to_argon2_params()?,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses Argon2id with random salt generation.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Parameters and salt are taken from the stored hash, not from this
    /// hasher, so credentials produced under older costs still verify.
    /// A hash that cannot be parsed never matches.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Whether a stored hash was produced with parameters other than the current ones.
    ///
    /// Unparseable hashes also report true.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return true;
        };

        if parsed_hash.algorithm.as_str() != "argon2id" {
            return true;
        }

        match Params::try_from(&parsed_hash) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
