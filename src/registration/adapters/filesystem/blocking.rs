//! Blocking operation helpers for the file-backed adapter.

use crate::registration::ports::{RegistrationStorageError, RegistrationStorageResult};

/// Runs a blocking filesystem operation on the blocking thread pool.
///
/// Join failures are reported as persistence errors.
pub(super) async fn run_blocking<F, T>(f: F) -> RegistrationStorageResult<T>
where
    F: FnOnce() -> RegistrationStorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(RegistrationStorageError::persistence)?
}
