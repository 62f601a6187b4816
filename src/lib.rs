//! Credential hashing, user authentication and account provisioning for the
//! PSX financial analysis assistant.

pub mod auth;
pub mod config;
pub mod error;
pub mod provision;
pub mod store;
pub mod utils;

pub use auth::{AuthenticatedUser, Authenticator, LoginService, PasswordHasher, build_authenticator};
pub use config::AuthConfig;
pub use error::PsxAuthError;
