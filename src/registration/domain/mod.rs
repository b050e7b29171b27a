//! Domain model for scope-keyed registration jobs.
//!
//! The registration domain models scope keys, the durable registration
//! record stored per scope, and the job requests that mutate it. Scheduling
//! and persistence concerns remain outside this boundary.

mod error;
mod ids;
mod job;
mod record;
mod scope;
mod script;
mod status;

pub use error::{ParseJobKindError, ParseJobStatusError, RegistrationDomainError};
pub use ids::{JobId, RegistrationId};
pub use job::{JobKind, JobRequest};
pub use record::RegistrationRecord;
pub use scope::ScopeKey;
pub use script::{ScriptDigest, ScriptSource};
pub use status::JobStatus;
