//! Authentication strategies
//!
//! The host calls a single [`Authenticator`] chosen at start-up from
//! [`AuthConfig::strategy`]. Every strategy answers the same way for a wrong
//! password and for an unknown account.

use std::sync::Arc;

use log::{info, warn};

use super::credentials::{PasswordHasher, constant_time_eq};
use super::permissions::{Permissions, Role};
use super::results::{AuthMethod, AuthenticatedUser};
use super::validator::validate_login;
use crate::config::{AuthConfig, StrategyKind};
use crate::error::{AuthError, BuildError};
use crate::store::UserStore;

/// Input length limits applied before any strategy runs.
#[derive(Debug, Clone, Copy)]
pub struct InputLimits {
    pub max_username_length: usize,
    pub max_password_length: usize,
}

impl InputLimits {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_username_length: config.max_username_length,
            max_password_length: config.max_password_length,
        }
    }

    fn check(&self, username: &str, password: &str) -> Result<(), AuthError> {
        validate_login(
            username,
            password,
            self.max_username_length,
            self.max_password_length,
        )
    }
}

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Fallback administrator configured through the environment.
pub struct AdminAuthenticator {
    username: String,
    password: String,
    project: String,
}

impl AdminAuthenticator {
    /// `None` unless both admin fields are configured and non-empty.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let (username, password) = config.admin_credentials()?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
            project: config.project.clone(),
        })
    }
}

impl Authenticator for AdminAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        // Evaluate both comparisons so the timing does not depend on which one failed.
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if !(user_ok & pass_ok) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(AuthenticatedUser {
            identifier: username.to_string(),
            role: Role::Admin,
            name: "Admin User".to_string(),
            project: self.project.clone(),
            permissions: Permissions::for_role(Role::Admin),
            user_id: None,
            auth_method: AuthMethod::EnvAdmin,
            created_at: None,
        })
    }
}

/// Checks the password against the hashed credential in the user table.
pub struct DatabaseAuthenticator {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    project: String,
}

impl DatabaseAuthenticator {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, project: impl Into<String>) -> Self {
        Self {
            store,
            hasher,
            project: project.into(),
        }
    }
}

impl Authenticator for DatabaseAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        let Some(record) = self.store.find_by_identifier(username)? else {
            self.hasher.burn(password);
            return Err(AuthError::InvalidCredentials);
        };

        let Some(credential) = record.credential() else {
            if record.has_legacy_password() {
                warn!(
                    "User {} only has a plaintext password; re-provision the account",
                    record.identifier
                );
            } else {
                warn!("User {} has no stored credential", record.identifier);
            }
            self.hasher.burn(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.verify(&self.hasher, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let metadata = record.metadata;
        let role = metadata
            .role
            .as_deref()
            .map(Role::parse)
            .unwrap_or(Role::User);
        Ok(AuthenticatedUser {
            name: metadata.name.unwrap_or_else(|| record.identifier.clone()),
            identifier: record.identifier,
            role,
            project: metadata.project.unwrap_or_else(|| self.project.clone()),
            permissions: metadata.permissions.unwrap_or_default(),
            user_id: Some(record.id),
            auth_method: AuthMethod::Database,
            created_at: Some(record.created_at),
        })
    }
}

/// Tries each strategy in order; the first success wins.
pub struct ChainAuthenticator {
    strategies: Vec<Box<dyn Authenticator>>,
}

impl ChainAuthenticator {
    pub fn new(strategies: Vec<Box<dyn Authenticator>>) -> Self {
        Self { strategies }
    }
}

impl Authenticator for ChainAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut unavailable = None;
        for strategy in &self.strategies {
            match strategy.authenticate(username, password) {
                Ok(user) => return Ok(user),
                Err(AuthError::Unavailable(reason)) => {
                    warn!("Authentication backend unavailable: {}", reason);
                    unavailable = Some(reason);
                }
                Err(AuthError::InvalidCredentials) => {}
                Err(e) => return Err(e),
            }
        }
        Err(match unavailable {
            Some(reason) => AuthError::Unavailable(reason),
            None => AuthError::InvalidCredentials,
        })
    }
}

/// Host-facing entry point: validates input, runs the configured strategy
/// and logs the outcome.
pub struct LoginService {
    limits: InputLimits,
    inner: Box<dyn Authenticator>,
}

impl LoginService {
    pub fn new(limits: InputLimits, inner: Box<dyn Authenticator>) -> Self {
        Self { limits, inner }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        self.authenticate(username, password)
    }
}

impl Authenticator for LoginService {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        self.limits.check(username, password)?;
        match self.inner.authenticate(username, password) {
            Ok(user) => {
                info!("User {} authenticated via {:?}", user.identifier, user.auth_method);
                Ok(user)
            }
            Err(e) => {
                warn!("Login denied for {}: {}", username, e);
                Err(e)
            }
        }
    }
}

/// Selects the authentication strategy once, at process start.
pub fn build_authenticator(
    config: &AuthConfig,
    store: Option<Arc<dyn UserStore>>,
) -> Result<LoginService, BuildError> {
    let hasher = PasswordHasher::from_config(config)?;
    let database = store.map(|s| DatabaseAuthenticator::new(s, hasher, config.project.clone()));
    let admin = AdminAuthenticator::from_config(config);

    let inner: Box<dyn Authenticator> = match config.strategy {
        StrategyKind::Admin => Box::new(admin.ok_or(BuildError::MissingAdmin)?),
        StrategyKind::Database => Box::new(database.ok_or(BuildError::MissingStore)?),
        StrategyKind::Chain => {
            let mut strategies: Vec<Box<dyn Authenticator>> = Vec::new();
            if let Some(admin) = admin {
                strategies.push(Box::new(admin));
            }
            if let Some(database) = database {
                strategies.push(Box::new(database));
            }
            if strategies.is_empty() {
                return Err(BuildError::MissingStore);
            }
            Box::new(ChainAuthenticator::new(strategies))
        }
    };

    info!("Authentication strategy: {:?}", config.strategy);
    Ok(LoginService::new(InputLimits::from_config(config), inner))
}
