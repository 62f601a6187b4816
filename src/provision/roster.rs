//! Accounts to provision.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::auth::permissions::Role;
use crate::error::ProvisionError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl RosterEntry {
    fn new(username: &str, name: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            name: name.to_string(),
            role,
        }
    }
}

/// The ten demo accounts handed out to the analysis team.
pub fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("analyst1", "Financial Analyst 1", Role::Analyst),
        RosterEntry::new("analyst2", "Financial Analyst 2", Role::Analyst),
        RosterEntry::new("manager1", "Portfolio Manager 1", Role::Manager),
        RosterEntry::new("manager2", "Portfolio Manager 2", Role::Manager),
        RosterEntry::new("researcher1", "Research Associate 1", Role::Researcher),
        RosterEntry::new("researcher2", "Research Associate 2", Role::Researcher),
        RosterEntry::new("trader1", "Trading Specialist 1", Role::Trader),
        RosterEntry::new("trader2", "Trading Specialist 2", Role::Trader),
        RosterEntry::new("risk_analyst", "Risk Analyst", Role::RiskAnalyst),
        RosterEntry::new("compliance", "Compliance Officer", Role::Compliance),
    ]
}

/// Reads a JSON array of `{ "username", "name", "role" }` objects.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>, ProvisionError> {
    let raw = fs::read_to_string(path)?;
    let roster: Vec<RosterEntry> = serde_json::from_str(&raw)
        .map_err(|e| ProvisionError::Roster(format!("{}: {}", path.display(), e)))?;
    check_roster(&roster)?;
    Ok(roster)
}

/// Usernames must be non-empty, free of whitespace and unique.
pub fn check_roster(roster: &[RosterEntry]) -> Result<(), ProvisionError> {
    if roster.is_empty() {
        return Err(ProvisionError::Roster("roster is empty".into()));
    }
    let mut seen = HashSet::new();
    for entry in roster {
        if entry.username.is_empty() || entry.username.chars().any(char::is_whitespace) {
            return Err(ProvisionError::Roster(format!(
                "invalid username {:?}",
                entry.username
            )));
        }
        if !seen.insert(entry.username.as_str()) {
            return Err(ProvisionError::Roster(format!(
                "duplicate username {}",
                entry.username
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_roster_is_ten_unique_accounts() {
        let roster = default_roster();
        assert_eq!(roster.len(), 10);
        assert!(check_roster(&roster).is_ok());
        assert_eq!(roster[8].role, Role::RiskAnalyst);
    }

    #[test]
    fn loads_roster_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"username":"ops1","name":"Ops Lead","role":"manager"}}]"#
        )
        .unwrap();
        let roster = load_roster(file.path()).unwrap();
        assert_eq!(roster, vec![RosterEntry::new("ops1", "Ops Lead", Role::Manager)]);
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let roster = vec![
            RosterEntry::new("trader1", "A", Role::Trader),
            RosterEntry::new("trader1", "B", Role::Trader),
        ];
        assert!(matches!(check_roster(&roster), Err(ProvisionError::Roster(_))));
    }

    #[test]
    fn malformed_roster_file_is_a_roster_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_roster(file.path()), Err(ProvisionError::Roster(_))));
    }
}
