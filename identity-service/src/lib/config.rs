use std::env;
use std::fmt;

use auth::HashingParams;
use auth::JwtHandler;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Absent means the in-memory credential store is used.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults (7 day tokens, argon2 recommended costs)
    ///
    /// The loaded configuration is validated before it is returned.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let defaults = HashingParams::default();
        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 8080)?
            .set_default("jwt.secret", "")?
            .set_default("jwt.expiration_hours", 7 * 24)?
            .set_default("password.memory_kib", defaults.memory_kib)?
            .set_default("password.iterations", defaults.iterations)?
            .set_default("password.parallelism", defaults.parallelism)?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service must not start with.
    ///
    /// # Errors
    /// * Empty JWT secret
    /// * Token lifetime that is not positive or exceeds `auth::MAX_VALIDITY_DAYS`
    /// * Hashing costs argon2 refuses
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be set to a non-empty value".to_string(),
            ));
        }

        let validity = self.token_validity()?;
        JwtHandler::check_validity(validity)
            .map_err(|e| ConfigError::Message(format!("jwt.expiration_hours: {}", e)))?;

        self.hashing_params()
            .validate()
            .map_err(|e| ConfigError::Message(format!("password: {}", e)))?;

        Ok(())
    }

    pub fn token_validity(&self) -> Result<Duration, ConfigError> {
        Duration::try_hours(self.jwt.expiration_hours).ok_or_else(|| {
            ConfigError::Message(format!(
                "jwt.expiration_hours out of range, got {}",
                self.jwt.expiration_hours
            ))
        })
    }

    pub fn hashing_params(&self) -> HashingParams {
        HashingParams {
            memory_kib: self.password.memory_kib,
            iterations: self.password.iterations,
            parallelism: self.password.parallelism,
        }
    }
}
