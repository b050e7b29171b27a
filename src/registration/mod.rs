//! Registration job coordination for scope-keyed registries.
//!
//! Jobs that create, update, or remove a registration are routed through a
//! [`services::JobCoordinator`], which keeps one FIFO queue per scope, starts
//! only the head of each queue, and fans the head's outcome out to every
//! caller whose request was coalesced into it. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
