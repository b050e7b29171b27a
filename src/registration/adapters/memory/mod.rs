//! In-memory storage adapter.

mod storage;

pub use storage::InMemoryRegistrationStorage;
