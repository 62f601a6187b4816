//! Bulk account provisioning
//!
//! Generates a password per roster entry, hashes it, and produces the
//! `"User"` rows together with the plaintext hand-out list. Rows can be
//! emitted as a SQL script or inserted straight into a [`UserStore`].

pub mod password;
pub mod report;
pub mod roster;
pub mod sql;

use std::path::Path;

use log::{error, info, warn};

use crate::auth::credentials::PasswordHasher;
use crate::auth::permissions::{Permissions, Role};
use crate::config::AuthConfig;
use crate::error::{CredentialError, ProvisionError, StoreError};
use crate::store::{UserMetadata, UserRecord, UserStore};

use report::{render_credentials_file, write_outputs};
use sql::render_insert_script;

pub use password::PasswordGenerator;
pub use roster::{RosterEntry, default_roster, load_roster};

/// A freshly provisioned account: the row to persist plus the plaintext
/// password to hand out once.
#[derive(Debug, Clone)]
pub struct ProvisionedUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub record: UserRecord,
}

/// Outcome of inserting provisioned users into a store
#[derive(Debug, Default)]
pub struct InsertSummary {
    pub inserted: Vec<String>,
    pub failed: Vec<(String, StoreError)>,
}

pub struct Provisioner {
    hasher: PasswordHasher,
    generator: PasswordGenerator,
    project: String,
    created_by: String,
}

impl Provisioner {
    pub fn new(
        hasher: PasswordHasher,
        generator: PasswordGenerator,
        project: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            hasher,
            generator,
            project: project.into(),
            created_by: created_by.into(),
        }
    }

    pub fn from_config(config: &AuthConfig, created_by: &str) -> Result<Self, CredentialError> {
        Ok(Self::new(
            PasswordHasher::from_config(config)?,
            PasswordGenerator::new(config.password_length),
            config.project.clone(),
            created_by,
        ))
    }

    /// Creates one account per roster entry.
    pub fn provision(&self, roster: &[RosterEntry]) -> Result<Vec<ProvisionedUser>, ProvisionError> {
        roster::check_roster(roster)?;
        info!("Provisioning {} users", roster.len());

        roster
            .iter()
            .map(|entry| self.provision_one(entry))
            .collect()
    }

    fn provision_one(&self, entry: &RosterEntry) -> Result<ProvisionedUser, ProvisionError> {
        let password = self.generator.generate();
        let credential = self.hasher.derive(&password)?;

        let metadata = UserMetadata {
            role: Some(entry.role.as_str().to_string()),
            name: Some(entry.name.clone()),
            project: Some(self.project.clone()),
            password_hash: Some(credential.hash),
            salt: Some(credential.salt),
            iterations: Some(self.hasher.iterations()),
            created_by: Some(self.created_by.clone()),
            permissions: Some(Permissions::for_role(entry.role)),
            password: None,
        };

        info!("Generated: {} ({})", entry.username, entry.role);
        Ok(ProvisionedUser {
            username: entry.username.clone(),
            password,
            name: entry.name.clone(),
            role: entry.role,
            record: UserRecord::new(entry.username.clone(), metadata),
        })
    }
}

/// Inserts each user, continuing past individual failures.
pub fn insert_users(store: &dyn UserStore, users: &[ProvisionedUser]) -> InsertSummary {
    let mut summary = InsertSummary::default();
    for user in users {
        match store.insert(&user.record) {
            Ok(()) => {
                info!("Created user: {} ({})", user.username, user.role);
                summary.inserted.push(user.username.clone());
            }
            Err(e) => {
                error!("Error creating user {}: {}", user.username, e);
                summary.failed.push((user.username.clone(), e));
            }
        }
    }
    summary
}

/// Persists a provisioning run.
///
/// With a store, users are inserted first and only the ones that were stored
/// appear in the SQL script and the credentials file. Outputs are not touched
/// when nothing was stored. Any failed insert is returned as
/// [`ProvisionError::InsertFailed`] after the outputs are written.
pub fn persist(
    users: Vec<ProvisionedUser>,
    store: Option<&dyn UserStore>,
    sql_path: &Path,
    credentials_path: &Path,
) -> Result<Vec<ProvisionedUser>, ProvisionError> {
    let (kept, failed) = match store {
        Some(store) => {
            let summary = insert_users(store, &users);
            let kept: Vec<ProvisionedUser> = users
                .into_iter()
                .filter(|u| summary.inserted.contains(&u.username))
                .collect();
            let failed: Vec<String> = summary.failed.into_iter().map(|(u, _)| u).collect();
            (kept, failed)
        }
        None => (users, Vec::new()),
    };

    if kept.is_empty() {
        warn!("No users were stored; leaving existing output files untouched");
    } else {
        let records: Vec<UserRecord> = kept.iter().map(|u| u.record.clone()).collect();
        let sql = render_insert_script(&records)?;
        write_outputs(sql_path, &sql, credentials_path, &render_credentials_file(&kept))?;
    }

    if failed.is_empty() {
        Ok(kept)
    } else {
        Err(ProvisionError::InsertFailed(failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;

    fn provisioner() -> Provisioner {
        Provisioner::new(
            PasswordHasher::new(1_000, 32).unwrap(),
            PasswordGenerator::new(12),
            "PSX",
            "setup_script",
        )
    }

    #[test]
    fn provisioned_password_verifies_against_its_record() {
        let provisioner = provisioner();
        let users = provisioner.provision(&default_roster()).unwrap();
        assert_eq!(users.len(), 10);

        let hasher = PasswordHasher::new(1_000, 32).unwrap();
        for user in &users {
            let credential = user.record.credential().unwrap();
            assert_eq!(credential.iterations, Some(1_000));
            assert!(credential.verify(&hasher, &user.password));
            assert!(user.record.metadata.password.is_none());
        }
    }

    #[test]
    fn metadata_carries_role_permissions() {
        let users = provisioner().provision(&default_roster()).unwrap();
        let trader = users.iter().find(|u| u.username == "trader1").unwrap();
        let metadata = &trader.record.metadata;
        assert_eq!(metadata.role.as_deref(), Some("trader"));
        assert_eq!(metadata.created_by.as_deref(), Some("setup_script"));
        assert_eq!(metadata.permissions, Some(Permissions::for_role(Role::Trader)));
    }

    #[test]
    fn salts_differ_between_accounts() {
        let users = provisioner().provision(&default_roster()).unwrap();
        let mut salts: Vec<_> = users
            .iter()
            .map(|u| u.record.metadata.salt.clone().unwrap())
            .collect();
        salts.sort();
        salts.dedup();
        assert_eq!(salts.len(), users.len());
    }

    #[test]
    fn insert_reports_duplicates_and_keeps_going() {
        let store = InMemoryUserStore::new();
        let users = provisioner().provision(&default_roster()).unwrap();
        store.insert(&users[0].record).unwrap();

        let summary = insert_users(&store, &users);
        assert_eq!(summary.inserted.len(), 9);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "analyst1");
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn persist_hands_out_only_stored_passwords() {
        let dir = tempfile::tempdir().unwrap();
        let sql_path = dir.path().join("insert_users.sql");
        let creds_path = dir.path().join("user_credentials.txt");

        let store = InMemoryUserStore::new();
        let users = provisioner().provision(&default_roster()).unwrap();
        store.insert(&users[0].record).unwrap();
        let skipped_password = users[0].password.clone();

        let err = persist(users, Some(&store as &dyn UserStore), &sql_path, &creds_path).unwrap_err();
        assert!(matches!(&err, ProvisionError::InsertFailed(names) if names == &["analyst1"]));

        let creds = std::fs::read_to_string(&creds_path).unwrap();
        assert!(!creds.contains(&skipped_password));
        assert!(creds.contains("analyst2"));
        let sql = std::fs::read_to_string(&sql_path).unwrap();
        assert_eq!(sql.matches("INSERT INTO").count(), 9);
    }

    #[test]
    fn persist_without_store_writes_everyone() {
        let dir = tempfile::tempdir().unwrap();
        let sql_path = dir.path().join("insert_users.sql");
        let creds_path = dir.path().join("user_credentials.txt");

        let users = provisioner().provision(&default_roster()).unwrap();
        let kept = persist(users, None, &sql_path, &creds_path).unwrap();
        assert_eq!(kept.len(), 10);
        let sql = std::fs::read_to_string(&sql_path).unwrap();
        assert_eq!(sql.matches("INSERT INTO").count(), 10);
    }
}
