//! Scope registry: per-scope coordination of registration jobs.
//!
//! This crate serializes register, update, and unregister operations against
//! a persistent registry keyed by scope. For any scope at most one mutating
//! job touches storage at a time, equivalent requests are coalesced onto a
//! single job, and every caller is told the job's real outcome.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Scope keys, registration records, and job descriptions
//! - **Ports**: The asynchronous storage contract jobs run against
//! - **Adapters**: In-memory and file-backed storage implementations
//! - **Services**: The job coordinator, job protocols, and registry context
//!
//! # Modules
//!
//! - [`registration`]: Registration job coordination and storage

pub mod registration;
