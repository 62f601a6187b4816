//! SQLite-backed `"User"` table.
//!
//! Column names and quoting match the PostgreSQL table the provisioning
//! scripts target, so a generated `insert_users.sql` runs unchanged here.

use std::path::Path;

use log::{info, warn};
use parking_lot::Mutex;
use rusqlite::OptionalExtension;

use super::{UserMetadata, UserRecord, UserStore};
use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "User" (
    id TEXT PRIMARY KEY,
    identifier TEXT NOT NULL UNIQUE,
    metadata TEXT NOT NULL,
    "createdAt" TEXT NOT NULL,
    "updatedAt" TEXT NOT NULL
);
"#;

pub struct SqliteUserStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteUserStore {
    /// Open (or create) the user database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        info!("Opened user database {}", db_path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(rusqlite::Connection::open_in_memory()?)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Applies a SQL script such as the one produced by
    /// [`render_insert_script`](crate::provision::sql::render_insert_script).
    /// A failed script leaves no partial transaction behind.
    pub fn execute_script(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        match conn.execute_batch(sql) {
            Ok(()) => Ok(()),
            Err(e) => {
                if !conn.is_autocommit() {
                    if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                        warn!("Rollback after failed script also failed: {}", rollback);
                    }
                }
                Err(map_insert_error(e, "script"))
            }
        }
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(r#"SELECT COUNT(*) FROM "User""#, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl UserStore for SqliteUserStore {
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                r#"SELECT id, identifier, metadata, "createdAt", "updatedAt"
                   FROM "User" WHERE identifier = ?1"#,
                rusqlite::params![identifier],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, identifier, metadata, created_at, updated_at)) = row else {
            return Ok(None);
        };
        let metadata: UserMetadata = serde_json::from_str(&metadata)?;
        Ok(Some(UserRecord {
            id,
            identifier,
            metadata,
            created_at,
            updated_at,
        }))
    }

    fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let metadata = record.metadata_json()?;
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO "User" (id, identifier, metadata, "createdAt", "updatedAt")
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            rusqlite::params![
                record.id,
                record.identifier,
                metadata,
                record.created_at,
                record.updated_at
            ],
        )
        .map_err(|e| map_insert_error(e, &record.identifier))?;
        Ok(())
    }
}

fn map_insert_error(error: rusqlite::Error, identifier: &str) -> StoreError {
    match error {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateIdentifier(identifier.to_string())
        }
        e => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(identifier: &str) -> UserRecord {
        UserRecord::new(
            identifier,
            UserMetadata {
                role: Some("analyst".into()),
                name: Some("Financial Analyst 1".into()),
                password_hash: Some("ab".repeat(32)),
                salt: Some("cd".repeat(32)),
                ..UserMetadata::default()
            },
        )
    }

    #[test]
    fn insert_and_find_round_trip_on_disk() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteUserStore::open(&tmp.path().join("users.db")).unwrap();

        let record = sample("analyst1");
        store.insert(&record).unwrap();

        let found = store.find_by_identifier("analyst1").unwrap().unwrap();
        assert_eq!(found, record);
        assert!(store.find_by_identifier("ANALYST1").unwrap().is_none());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store.insert(&sample("manager1")).unwrap();
        assert!(matches!(
            store.insert(&sample("manager1")),
            Err(StoreError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn corrupt_metadata_is_a_serialization_error() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store
            .execute_script(
                r#"INSERT INTO "User" (id, identifier, metadata, "createdAt", "updatedAt")
                   VALUES ('1', 'broken', '{not json', 'x', 'x');"#,
            )
            .unwrap();
        assert!(matches!(
            store.find_by_identifier("broken"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn failed_script_rolls_back() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store.insert(&sample("trader1")).unwrap();

        let script = r#"BEGIN;
INSERT INTO "User" (id, identifier, metadata, "createdAt", "updatedAt") VALUES ('a', 'trader2', '{}', 'x', 'x');
INSERT INTO "User" (id, identifier, metadata, "createdAt", "updatedAt") VALUES ('b', 'trader1', '{}', 'x', 'x');
COMMIT;"#;
        assert!(store.execute_script(script).is_err());
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.find_by_identifier("trader2").unwrap().is_none());
    }
}
