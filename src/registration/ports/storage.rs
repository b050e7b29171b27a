//! Storage port for scope-keyed registration persistence.

use crate::registration::domain::{RegistrationRecord, ScopeKey};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for registration storage operations.
pub type RegistrationStorageResult<T> = Result<T, RegistrationStorageError>;

/// Persistence contract that registration jobs run against.
///
/// Every call completes exactly once. A single job issues at most one call
/// of each kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationStorage: Send + Sync {
    /// Finds the registration stored for `scope`.
    ///
    /// Returns `Ok(None)` when no registration exists.
    async fn find_by_scope(
        &self,
        scope: &ScopeKey,
    ) -> RegistrationStorageResult<Option<RegistrationRecord>>;

    /// Writes `record`, replacing any registration stored for its scope.
    async fn store(&self, record: &RegistrationRecord) -> RegistrationStorageResult<()>;

    /// Deletes the registration stored for `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationStorageError::NotFound`] when nothing is stored
    /// for the scope.
    async fn delete(&self, scope: &ScopeKey) -> RegistrationStorageResult<()>;

    /// Returns every stored registration.
    async fn list_all(&self) -> RegistrationStorageResult<Vec<RegistrationRecord>>;
}

/// Errors returned by registration storage implementations.
#[derive(Debug, Clone, Error)]
pub enum RegistrationStorageError {
    /// No registration is stored for the scope.
    #[error("no registration stored for scope {0}")]
    NotFound(ScopeKey),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted registration data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RegistrationStorageError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
