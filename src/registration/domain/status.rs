//! Final status of a registration job.

use super::ParseJobStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status reported to every caller attached to a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The job did what was asked, including removing an absent registration.
    Success,
    /// The job needed an existing registration and none was stored.
    NotFound,
    /// The storage backend reported a failure.
    StorageError,
    /// The coordinator shut down before the job could start.
    Aborted,
}

impl JobStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::StorageError => "storage_error",
            Self::Aborted => "aborted",
        }
    }

    /// Returns `true` for [`JobStatus::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "success" => Ok(Self::Success),
            "not_found" => Ok(Self::NotFound),
            "storage_error" => Ok(Self::StorageError),
            "aborted" => Ok(Self::Aborted),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}
