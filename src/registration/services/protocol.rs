//! Storage protocols run by each job kind.
//!
//! Every protocol follows the same shape: look up the scope, decide whether
//! a write is needed, perform at most one write, and report an outcome.
//! Storage failures end the job; nothing is retried here.

use super::JobOutcome;
use crate::registration::{
    domain::{JobRequest, RegistrationRecord, ScopeKey, ScriptSource},
    ports::{RegistrationStorage, RegistrationStorageError, RegistrationStorageResult},
};
use mockable::Clock;
use std::sync::Arc;

/// Runs `request` against `storage` and returns its outcome.
pub(super) async fn run_job<S, C>(request: JobRequest, storage: Arc<S>, clock: Arc<C>) -> JobOutcome
where
    S: RegistrationStorage + ?Sized,
    C: Clock + Send + Sync,
{
    let result = match &request {
        JobRequest::Register { scope, script } => {
            register(storage.as_ref(), clock.as_ref(), scope, script).await
        }
        JobRequest::Update { scope, script } => {
            update(storage.as_ref(), clock.as_ref(), scope, script).await
        }
        JobRequest::Unregister { scope } => unregister(storage.as_ref(), scope).await,
    };

    result.unwrap_or_else(|err| {
        tracing::warn!(
            scope = %request.scope(),
            kind = %request.kind(),
            error = %err,
            "registration job failed in storage"
        );
        JobOutcome::StorageError(err)
    })
}

/// Looks up the scope, treating a backend-reported `NotFound` as absence.
async fn find_existing<S>(
    storage: &S,
    scope: &ScopeKey,
) -> RegistrationStorageResult<Option<RegistrationRecord>>
where
    S: RegistrationStorage + ?Sized,
{
    match storage.find_by_scope(scope).await {
        Err(RegistrationStorageError::NotFound(_)) => Ok(None),
        other => other,
    }
}

async fn register<S, C>(
    storage: &S,
    clock: &C,
    scope: &ScopeKey,
    script: &ScriptSource,
) -> RegistrationStorageResult<JobOutcome>
where
    S: RegistrationStorage + ?Sized,
    C: Clock + Send + Sync,
{
    let record = match find_existing(storage, scope).await? {
        Some(existing) if existing.serves(script) => {
            return Ok(JobOutcome::Success(Some(existing)));
        }
        Some(existing) => existing.replaced_with(script.clone(), clock),
        None => RegistrationRecord::new(scope.clone(), script.clone(), clock),
    };
    storage.store(&record).await?;
    Ok(JobOutcome::Success(Some(record)))
}

async fn update<S, C>(
    storage: &S,
    clock: &C,
    scope: &ScopeKey,
    script: &ScriptSource,
) -> RegistrationStorageResult<JobOutcome>
where
    S: RegistrationStorage + ?Sized,
    C: Clock + Send + Sync,
{
    let Some(existing) = find_existing(storage, scope).await? else {
        return Ok(JobOutcome::NotFound);
    };
    if existing.serves(script) {
        return Ok(JobOutcome::Success(Some(existing)));
    }
    let record = existing.replaced_with(script.clone(), clock);
    storage.store(&record).await?;
    Ok(JobOutcome::Success(Some(record)))
}

async fn unregister<S>(storage: &S, scope: &ScopeKey) -> RegistrationStorageResult<JobOutcome>
where
    S: RegistrationStorage + ?Sized,
{
    if find_existing(storage, scope).await?.is_none() {
        tracing::debug!(scope = %scope, "no registration to remove");
        return Ok(JobOutcome::Success(None));
    }
    match storage.delete(scope).await {
        Ok(()) | Err(RegistrationStorageError::NotFound(_)) => Ok(JobOutcome::Success(None)),
        Err(err) => Err(err),
    }
}
