//! In-memory storage for scope registrations.

use crate::registration::{
    domain::{RegistrationRecord, ScopeKey},
    ports::{RegistrationStorage, RegistrationStorageError, RegistrationStorageResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory registration storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistrationStorage {
    state: Arc<RwLock<HashMap<ScopeKey, RegistrationRecord>>>,
}

impl InMemoryRegistrationStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage seeded with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = RegistrationRecord>) -> Self {
        let registrations = records
            .into_iter()
            .map(|record| (record.scope().clone(), record))
            .collect();
        Self {
            state: Arc::new(RwLock::new(registrations)),
        }
    }
}

fn poisoned(err: impl std::fmt::Display) -> RegistrationStorageError {
    RegistrationStorageError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RegistrationStorage for InMemoryRegistrationStorage {
    async fn find_by_scope(
        &self,
        scope: &ScopeKey,
    ) -> RegistrationStorageResult<Option<RegistrationRecord>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(scope).cloned())
    }

    async fn store(&self, record: &RegistrationRecord) -> RegistrationStorageResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.insert(record.scope().clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, scope: &ScopeKey) -> RegistrationStorageResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state
            .remove(scope)
            .map(|_| ())
            .ok_or_else(|| RegistrationStorageError::NotFound(scope.clone()))
    }

    async fn list_all(&self) -> RegistrationStorageResult<Vec<RegistrationRecord>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut records: Vec<_> = state.values().cloned().collect();
        records.sort_by(|left, right| left.scope().cmp(right.scope()));
        Ok(records)
    }
}
