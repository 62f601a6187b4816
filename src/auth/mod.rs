//! Authentication system
//!
//! Credential hashing, login validation, role permissions and the
//! strategies the host application calls to authenticate a user.

pub mod credentials;
pub mod permissions;
pub mod results;
pub mod strategy;
pub mod validator;

pub use credentials::{CredentialRecord, DerivedCredential, PasswordHasher};
pub use permissions::{Permissions, Role};
pub use results::{AuthMethod, AuthenticatedUser};
pub use strategy::{
    AdminAuthenticator, Authenticator, ChainAuthenticator, DatabaseAuthenticator, InputLimits,
    LoginService, build_authenticator,
};
pub use validator::{is_valid_input, validate_login};
