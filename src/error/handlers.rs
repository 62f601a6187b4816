//! Error handlers
//!
//! Provides error reporting and exit-code mapping for the CLI.

use crate::error::types::{AuthError, PsxAuthError};
use log::error;

/// Handle a crate-level error
pub fn handle_error(err: &PsxAuthError) {
    error!("psx-auth error: {}", err);
}

/// Convert error to a process exit code
pub fn error_to_exit_code(err: &PsxAuthError) -> u8 {
    match err {
        PsxAuthError::Config(_) => 78,
        PsxAuthError::Credential(_) => 65,
        PsxAuthError::Auth(AuthError::InvalidCredentials) => 1,
        PsxAuthError::Auth(AuthError::MalformedInput(_)) => 64,
        PsxAuthError::Auth(AuthError::Unavailable(_)) => 69,
        PsxAuthError::Build(_) => 78,
        PsxAuthError::Store(_) => 69,
        PsxAuthError::Provision(_) => 74,
        PsxAuthError::Io(_) => 74,
    }
}
