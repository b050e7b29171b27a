//! Port contracts for registration job execution.

mod storage;

pub use storage::{RegistrationStorage, RegistrationStorageError, RegistrationStorageResult};

#[cfg(test)]
pub use storage::MockRegistrationStorage;
