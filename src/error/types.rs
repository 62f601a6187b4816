//! Error types
//!
//! Defines domain-specific error types for each module of the crate.

use std::fmt;
use std::io;

/// Credential hashing errors
#[derive(Debug)]
pub enum CredentialError {
    /// The password could not be represented as UTF-8 text.
    Encoding(String),
    /// The OS random source failed to produce a salt.
    Entropy(String),
    InvalidParams(String),
    /// Stored hash or salt is not usable. `verify` reports this as a mismatch.
    MalformedStoredData(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Encoding(s) => write!(f, "Password encoding error: {}", s),
            CredentialError::Entropy(s) => write!(f, "Secure random source failed: {}", s),
            CredentialError::InvalidParams(s) => write!(f, "Invalid hashing parameters: {}", s),
            CredentialError::MalformedStoredData(s) => write!(f, "Malformed stored credential: {}", s),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    MalformedInput(String),
    /// Wrong password or unknown account; the two are deliberately indistinguishable.
    InvalidCredentials,
    /// The backing store could not be consulted.
    Unavailable(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::Unavailable(s) => write!(f, "Authentication unavailable: {}", s),
        }
    }
}

impl std::error::Error for AuthError {}

/// Errors raised while assembling the configured authentication strategy
#[derive(Debug)]
pub enum BuildError {
    MissingStore,
    MissingAdmin,
    Credential(CredentialError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingStore => write!(f, "Strategy requires a user store"),
            BuildError::MissingAdmin => write!(f, "Strategy requires admin credentials"),
            BuildError::Credential(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<CredentialError> for BuildError {
    fn from(error: CredentialError) -> Self {
        BuildError::Credential(error)
    }
}

/// User store errors
#[derive(Debug)]
pub enum StoreError {
    Database(String),
    Serialization(serde_json::Error),
    DuplicateIdentifier(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(s) => write!(f, "Database error: {}", s),
            StoreError::Serialization(e) => write!(f, "Metadata serialization error: {}", e),
            StoreError::DuplicateIdentifier(u) => write!(f, "User already exists: {}", u),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        StoreError::Database(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error)
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Unavailable(error.to_string())
    }
}

/// Provisioning errors
#[derive(Debug)]
pub enum ProvisionError {
    Io(io::Error),
    Roster(String),
    Credential(CredentialError),
    Store(StoreError),
    /// Identifiers that could not be inserted; their passwords were not handed out.
    InsertFailed(Vec<String>),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::Io(e) => write!(f, "I/O error: {}", e),
            ProvisionError::Roster(s) => write!(f, "Invalid roster: {}", s),
            ProvisionError::Credential(e) => write!(f, "Credential error: {}", e),
            ProvisionError::Store(e) => write!(f, "Store error: {}", e),
            ProvisionError::InsertFailed(users) => {
                write!(f, "Could not insert {} user(s): {}", users.len(), users.join(", "))
            }
        }
    }
}

impl std::error::Error for ProvisionError {}

impl From<io::Error> for ProvisionError {
    fn from(error: io::Error) -> Self {
        ProvisionError::Io(error)
    }
}

impl From<CredentialError> for ProvisionError {
    fn from(error: CredentialError) -> Self {
        ProvisionError::Credential(error)
    }
}

impl From<StoreError> for ProvisionError {
    fn from(error: StoreError) -> Self {
        ProvisionError::Store(error)
    }
}

/// Crate-level error that encompasses all error types
#[derive(Debug)]
pub enum PsxAuthError {
    Config(config::ConfigError),
    Credential(CredentialError),
    Auth(AuthError),
    Build(BuildError),
    Store(StoreError),
    Provision(ProvisionError),
    Io(io::Error),
}

impl fmt::Display for PsxAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PsxAuthError::Config(e) => write!(f, "Configuration error: {}", e),
            PsxAuthError::Credential(e) => write!(f, "Credential error: {}", e),
            PsxAuthError::Auth(e) => write!(f, "Authentication error: {}", e),
            PsxAuthError::Build(e) => write!(f, "Authentication setup error: {}", e),
            PsxAuthError::Store(e) => write!(f, "Store error: {}", e),
            PsxAuthError::Provision(e) => write!(f, "Provisioning error: {}", e),
            PsxAuthError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PsxAuthError {}

impl From<config::ConfigError> for PsxAuthError {
    fn from(error: config::ConfigError) -> Self {
        PsxAuthError::Config(error)
    }
}

impl From<CredentialError> for PsxAuthError {
    fn from(error: CredentialError) -> Self {
        PsxAuthError::Credential(error)
    }
}

impl From<AuthError> for PsxAuthError {
    fn from(error: AuthError) -> Self {
        PsxAuthError::Auth(error)
    }
}

impl From<StoreError> for PsxAuthError {
    fn from(error: StoreError) -> Self {
        PsxAuthError::Store(error)
    }
}

impl From<ProvisionError> for PsxAuthError {
    fn from(error: ProvisionError) -> Self {
        PsxAuthError::Provision(error)
    }
}

impl From<BuildError> for PsxAuthError {
    fn from(error: BuildError) -> Self {
        PsxAuthError::Build(error)
    }
}

impl From<io::Error> for PsxAuthError {
    fn from(error: io::Error) -> Self {
        PsxAuthError::Io(error)
    }
}
