//! Application services for registration job coordination.

mod config;
mod context;
mod coordinator;
mod outcome;
mod protocol;
mod queue;

pub use config::{CoalescingPolicy, CoordinatorConfig};
pub use context::{RegistryContext, RegistryContextError, RegistryContextResult};
pub use coordinator::{CompletionCallback, JobCoordinator, Submission};
pub use outcome::JobOutcome;
