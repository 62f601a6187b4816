//! Roles and permission flags stored in user metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Analyst,
    Manager,
    Researcher,
    Trader,
    RiskAnalyst,
    Compliance,
    User,
}

impl Role {
    /// Parses a stored role name. Unknown names fall back to [`Role::User`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "analyst" => Role::Analyst,
            "manager" => Role::Manager,
            "researcher" => Role::Researcher,
            "trader" => Role::Trader,
            "risk_analyst" => Role::RiskAnalyst,
            "compliance" => Role::Compliance,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Analyst => "analyst",
            Role::Manager => "manager",
            Role::Researcher => "researcher",
            Role::Trader => "trader",
            Role::RiskAnalyst => "risk_analyst",
            Role::Compliance => "compliance",
            Role::User => "user",
        }
    }

    fn can_export(&self) -> bool {
        matches!(
            self,
            Role::Admin | Role::Manager | Role::Analyst | Role::RiskAnalyst
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission flags carried in the `permissions` metadata object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub analyze: bool,
    #[serde(default)]
    pub export: bool,
}

impl Permissions {
    /// Default grants for a newly provisioned account.
    pub fn for_role(role: Role) -> Self {
        Self {
            read: true,
            analyze: true,
            export: role.can_export(),
        }
    }

    /// Looks a permission up by name; unknown names are never granted.
    pub fn allows(&self, permission: &str) -> bool {
        match permission {
            "read" => self.read,
            "analyze" => self.analyze,
            "export" => self.export,
            _ => false,
        }
    }
}
