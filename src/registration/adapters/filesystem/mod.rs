//! File-backed storage adapter.
//!
//! Each scope is persisted as one JSON document inside a capability-scoped
//! directory. Blocking filesystem calls run on the tokio blocking pool.

mod blocking;
mod storage;

pub use storage::FileRegistrationStorage;
