//! Authentication input validation
//!
//! Rejects malformed usernames and passwords before any lookup or hashing.

use crate::error::AuthError;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
pub fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Validates the shape of a login attempt.
pub fn validate_login(
    username: &str,
    password: &str,
    max_username_length: usize,
    max_password_length: usize,
) -> Result<(), AuthError> {
    if !is_valid_input(username, max_username_length) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }
    if !is_valid_input(password, max_password_length) {
        return Err(AuthError::MalformedInput("Invalid password format".into()));
    }
    Ok(())
}
