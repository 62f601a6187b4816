//! Configuration management for psx-auth
//!
//! Settings come from built-in defaults, an optional TOML file and
//! `PSX_AUTH_*` environment overrides, in that order of precedence.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::auth::credentials::{DEFAULT_ITERATIONS, DEFAULT_SALT_BYTES, MIN_SALT_BYTES};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "psx-auth";

/// Environment variable prefix, e.g. `PSX_AUTH_ADMIN_PASSWORD`.
pub const ENV_PREFIX: &str = "PSX_AUTH";

/// Which authentication strategy the host should call.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Environment admin first, then the user table.
    Chain,
    Database,
    Admin,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    // ═══ CREDENTIAL HASHING ═══
    /// PBKDF2 iteration count used at creation and verification
    pub iterations: u32,

    /// Random salt length in bytes before hex encoding
    pub salt_bytes: usize,

    // ═══ AUTHENTICATION ═══
    pub strategy: StrategyKind,

    /// SQLite database holding the "User" table
    pub database_path: Option<String>,

    /// Fallback admin account.
    /// Environment: PSX_AUTH_ADMIN_USERNAME / PSX_AUTH_ADMIN_PASSWORD
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// Input limits applied before any lookup
    pub max_username_length: usize,
    pub max_password_length: usize,

    // ═══ PROVISIONING ═══
    /// Length of generated demo passwords
    pub password_length: usize,

    /// Project tag written into user metadata
    pub project: String,

    pub sql_output: String,
    pub credentials_output: String,

    // ═══ LOGGING ═══
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
}

impl AuthConfig {
    /// Load configuration from `psx-auth.toml` (optional) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file when given.
    /// An explicitly named file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Self::defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: AuthConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("iterations", DEFAULT_ITERATIONS as i64)?
            .set_default("salt_bytes", DEFAULT_SALT_BYTES as i64)?
            .set_default("strategy", "chain")?
            .set_default("max_username_length", 64_i64)?
            .set_default("max_password_length", 1024_i64)?
            .set_default("password_length", 12_i64)?
            .set_default("project", "PSX")?
            .set_default("sql_output", "insert_users.sql")?
            .set_default("credentials_output", "user_credentials.txt")?
            .set_default("log_level", "info")
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Message(
                "iterations must be greater than 0".into(),
            ));
        }

        if self.salt_bytes < MIN_SALT_BYTES {
            return Err(ConfigError::Message(format!(
                "salt_bytes must be at least {}",
                MIN_SALT_BYTES
            )));
        }

        if self.password_length < 8 {
            return Err(ConfigError::Message(
                "password_length must be at least 8".into(),
            ));
        }

        if self.max_username_length == 0 || self.max_password_length == 0 {
            return Err(ConfigError::Message(
                "input length limits must be greater than 0".into(),
            ));
        }

        match self.strategy {
            StrategyKind::Admin if self.admin_credentials().is_none() => {
                Err(ConfigError::Message(
                    "admin strategy requires admin_username and admin_password".into(),
                ))
            }
            StrategyKind::Database if self.database_path.is_none() => Err(ConfigError::Message(
                "database strategy requires database_path".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Admin fallback credentials, only when both are set and non-empty
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_username.as_deref(), self.admin_password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }

    pub fn database_path_buf(&self) -> Option<PathBuf> {
        self.database_path.as_ref().map(PathBuf::from)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt_bytes: DEFAULT_SALT_BYTES,
            strategy: StrategyKind::Chain,
            database_path: None,
            admin_username: None,
            admin_password: None,
            max_username_length: 64,
            max_password_length: 1024,
            password_length: 12,
            project: "PSX".to_string(),
            sql_output: "insert_users.sql".to_string(),
            credentials_output: "user_credentials.txt".to_string(),
            log_level: "info".to_string(),
        }
    }
}
