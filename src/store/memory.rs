//! In-process user store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{UserRecord, UserStore};
use crate::error::StoreError;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().get(identifier).cloned())
    }

    fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write();
        if users.contains_key(&record.identifier) {
            return Err(StoreError::DuplicateIdentifier(record.identifier.clone()));
        }
        users.insert(record.identifier.clone(), record.clone());
        Ok(())
    }
}
