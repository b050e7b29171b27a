//! Registry context wiring storage and the job coordinator together.

use super::{CoordinatorConfig, JobCoordinator, JobOutcome};
use crate::registration::{
    domain::{JobRequest, RegistrationRecord, ScopeKey, ScriptSource},
    ports::{RegistrationStorage, RegistrationStorageResult},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};

/// Errors returned while building a registry context.
#[derive(Debug, Error)]
pub enum RegistryContextError {
    /// The context was built outside a tokio runtime.
    #[error("registry context requires a tokio runtime: {0}")]
    RuntimeUnavailable(#[from] TryCurrentError),
}

/// Result type for registry context construction.
pub type RegistryContextResult<T> = Result<T, RegistryContextError>;

/// Owner of one storage backend and the coordinator serializing jobs on it.
///
/// Components that issue registration requests receive the context (or its
/// [`coordinator`](Self::coordinator)) explicitly; there is no global
/// instance.
pub struct RegistryContext<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    storage: Arc<S>,
    coordinator: JobCoordinator<S, C>,
}

impl<S, C> Clone for RegistryContext<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<S, C> RegistryContext<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a context whose jobs run on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryContextError::RuntimeUnavailable`] when called
    /// outside a tokio runtime.
    pub fn new(
        storage: Arc<S>,
        clock: Arc<C>,
        config: CoordinatorConfig,
    ) -> RegistryContextResult<Self> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(storage, clock, config, runtime))
    }

    /// Creates a context whose jobs run on `runtime`.
    #[must_use]
    pub fn with_runtime(
        storage: Arc<S>,
        clock: Arc<C>,
        config: CoordinatorConfig,
        runtime: Handle,
    ) -> Self {
        let coordinator = JobCoordinator::new(Arc::clone(&storage), clock, config, runtime);
        Self {
            storage,
            coordinator,
        }
    }

    /// Returns the job coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &JobCoordinator<S, C> {
        &self.coordinator
    }

    /// Returns the storage backend.
    #[must_use]
    pub const fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Registers `script` for `scope` and waits for the outcome.
    pub async fn register(&self, scope: ScopeKey, script: ScriptSource) -> JobOutcome {
        self.run(JobRequest::register(scope, script)).await
    }

    /// Points the registration for `scope` at `script` and waits for the
    /// outcome.
    pub async fn update(&self, scope: ScopeKey, script: ScriptSource) -> JobOutcome {
        self.run(JobRequest::update(scope, script)).await
    }

    /// Removes the registration for `scope` and waits for the outcome.
    pub async fn unregister(&self, scope: ScopeKey) -> JobOutcome {
        self.run(JobRequest::unregister(scope)).await
    }

    /// Submits `request` through the coordinator and waits for its outcome.
    pub async fn run(&self, request: JobRequest) -> JobOutcome {
        self.coordinator.submit_and_wait(request).await
    }

    /// Reads the registration stored for `scope` without queueing a job.
    ///
    /// # Errors
    ///
    /// Returns the storage backend's error unchanged.
    pub async fn find_registration(
        &self,
        scope: &ScopeKey,
    ) -> RegistrationStorageResult<Option<RegistrationRecord>> {
        self.storage.find_by_scope(scope).await
    }

    /// Lists every stored registration.
    ///
    /// # Errors
    ///
    /// Returns the storage backend's error unchanged.
    pub async fn registrations(&self) -> RegistrationStorageResult<Vec<RegistrationRecord>> {
        self.storage.list_all().await
    }

    /// Shuts the coordinator down; see [`JobCoordinator::shutdown`].
    pub fn shutdown(&self) -> usize {
        self.coordinator.shutdown()
    }

    /// Waits until every queued and running job has finished.
    pub async fn wait_idle(&self) {
        self.coordinator.wait_idle().await;
    }
}
