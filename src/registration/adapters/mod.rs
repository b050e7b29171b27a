//! Adapter implementations for the registration storage port.

pub mod filesystem;
pub mod memory;
