//! User table access
//!
//! Rows mirror the host application's `"User"` table: an id, the unique
//! login identifier, a JSON `metadata` document and two timestamps. The
//! credential fields live inside `metadata`.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::credentials::CredentialRecord;
use crate::auth::permissions::Permissions;
use crate::config::AuthConfig;
use crate::error::StoreError;

pub use memory::InMemoryUserStore;
pub use sqlite::SqliteUserStore;

/// JSON document stored in the `metadata` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// Plaintext password left by an early provisioning script. Read only so
    /// such rows can be reported; it is never accepted and never written.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// One row of the `"User"` table.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub identifier: String,
    pub metadata: UserMetadata,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRecord {
    /// New row with a random id and both timestamps set to now.
    pub fn new(identifier: impl Into<String>, metadata: UserMetadata) -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            identifier: identifier.into(),
            metadata,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Hashed credential fields, if this row carries both of them.
    pub fn credential(&self) -> Option<CredentialRecord> {
        let hash = self.metadata.password_hash.as_deref().filter(|h| !h.is_empty())?;
        let salt = self.metadata.salt.as_deref().filter(|s| !s.is_empty())?;
        Some(CredentialRecord {
            identifier: self.identifier.clone(),
            password_hash: hash.to_string(),
            salt: salt.to_string(),
            iterations: self.metadata.iterations,
        })
    }

    /// Whether the row only has the legacy plaintext password.
    pub fn has_legacy_password(&self) -> bool {
        self.metadata.password.is_some() && self.credential().is_none()
    }

    pub fn metadata_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.metadata)?)
    }
}

/// Lookup and insertion of user rows by identifier.
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive identifier match.
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Fails with [`StoreError::DuplicateIdentifier`] if the identifier exists.
    fn insert(&self, record: &UserRecord) -> Result<(), StoreError>;
}

/// Opens the configured SQLite database, if one is configured.
pub fn open_configured(config: &AuthConfig) -> Result<Option<Arc<SqliteUserStore>>, StoreError> {
    config
        .database_path_buf()
        .map(|path| SqliteUserStore::open(&path).map(Arc::new))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_plaintext_is_read_but_never_written() {
        let raw = r#"{"name":"User 1","password":"pass1","project":"PSX"}"#;
        let metadata: UserMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(metadata.password.as_deref(), Some("pass1"));

        let record = UserRecord::new("user1", metadata);
        assert!(record.has_legacy_password());
        assert!(record.credential().is_none());
        assert!(!record.metadata_json().unwrap().contains("pass1"));
    }

    #[test]
    fn credential_requires_hash_and_salt() {
        let metadata = UserMetadata {
            password_hash: Some("ab".repeat(32)),
            ..UserMetadata::default()
        };
        assert!(UserRecord::new("analyst1", metadata.clone()).credential().is_none());

        let metadata = UserMetadata {
            salt: Some("cd".repeat(32)),
            iterations: Some(100_000),
            ..metadata
        };
        let cred = UserRecord::new("analyst1", metadata).credential().unwrap();
        assert_eq!(cred.identifier, "analyst1");
        assert_eq!(cred.iterations, Some(100_000));
    }

    #[test]
    fn metadata_tolerates_unknown_fields() {
        let raw = r#"{"role":"trader","salt":"00","extra":{"nested":true}}"#;
        let metadata: UserMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(metadata.role.as_deref(), Some("trader"));
    }
}
