//! Authentication result types
//!
//! Defines the user handed back to the host after a successful login.

use serde::Serialize;

use super::permissions::{Permissions, Role};

/// How the user was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    EnvAdmin,
    Database,
}

/// Result of a successful authentication
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub identifier: String,
    pub role: Role,
    pub name: String,
    pub project: String,
    pub permissions: Permissions,
    pub user_id: Option<String>,
    pub auth_method: AuthMethod,
    pub created_at: Option<String>,
}

impl AuthenticatedUser {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.allows(permission)
    }
}
