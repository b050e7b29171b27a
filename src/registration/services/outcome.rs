//! Outcome delivered to callers of a completed job.

use crate::registration::{
    domain::{JobStatus, RegistrationRecord},
    ports::RegistrationStorageError,
};
use std::fmt;

/// Final result of a registration job, shared by every attached caller.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The job succeeded.
    ///
    /// Register and update jobs carry the registration now stored for the
    /// scope. Unregister jobs carry `None`, whether a registration was
    /// deleted or none existed.
    Success(Option<RegistrationRecord>),
    /// An update targeted a scope without a registration.
    NotFound,
    /// The storage backend failed; the error is passed through unchanged.
    StorageError(RegistrationStorageError),
    /// The coordinator shut down before the job started.
    Aborted,
}

impl JobOutcome {
    /// Returns the status of the outcome.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        match self {
            Self::Success(_) => JobStatus::Success,
            Self::NotFound => JobStatus::NotFound,
            Self::StorageError(_) => JobStatus::StorageError,
            Self::Aborted => JobStatus::Aborted,
        }
    }

    /// Returns the registration stored by a successful register or update.
    #[must_use]
    pub const fn registration(&self) -> Option<&RegistrationRecord> {
        match self {
            Self::Success(record) => record.as_ref(),
            Self::NotFound | Self::StorageError(_) | Self::Aborted => None,
        }
    }

    /// Returns the backend error of a failed job.
    #[must_use]
    pub const fn storage_error(&self) -> Option<&RegistrationStorageError> {
        match self {
            Self::StorageError(err) => Some(err),
            Self::Success(_) | Self::NotFound | Self::Aborted => None,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageError(err) => write!(f, "{}: {err}", self.status()),
            Self::Success(_) | Self::NotFound | Self::Aborted => f.write_str(self.status().as_str()),
        }
    }
}
