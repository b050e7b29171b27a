//! Storage double that lets tests hold jobs inside their storage calls.

use crate::registration::{
    adapters::memory::InMemoryRegistrationStorage,
    domain::{RegistrationRecord, ScopeKey},
    ports::{RegistrationStorage, RegistrationStorageError, RegistrationStorageResult},
    services::{CompletionCallback, JobOutcome},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Semaphore, oneshot};

/// A storage call observed by [`GatedStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Find(ScopeKey),
    Store(ScopeKey),
    Delete(ScopeKey),
}

/// In-memory storage whose lookups wait for permits released by the test.
pub struct GatedStorage {
    inner: InMemoryRegistrationStorage,
    gate: Option<Semaphore>,
    calls: Mutex<Vec<StorageCall>>,
    fail_next_find: AtomicBool,
    panic_next_find: AtomicBool,
}

impl GatedStorage {
    /// Storage that answers immediately.
    pub fn open(inner: InMemoryRegistrationStorage) -> Self {
        Self::build(inner, None)
    }

    /// Storage whose lookups block until [`release`](Self::release) is called.
    pub fn gated(inner: InMemoryRegistrationStorage) -> Self {
        Self::build(inner, Some(Semaphore::new(0)))
    }

    fn build(inner: InMemoryRegistrationStorage, gate: Option<Semaphore>) -> Self {
        Self {
            inner,
            gate,
            calls: Mutex::new(Vec::new()),
            fail_next_find: AtomicBool::new(false),
            panic_next_find: AtomicBool::new(false),
        }
    }

    pub fn release(&self, lookups: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(lookups);
        }
    }

    pub fn fail_next_find(&self) {
        self.fail_next_find.store(true, Ordering::SeqCst);
    }

    pub fn panic_next_find(&self) {
        self.panic_next_find.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, matches: impl Fn(&StorageCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub async fn wait_for_calls(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls().len() < expected {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("storage calls should arrive");
    }

    fn record(&self, call: StorageCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl RegistrationStorage for GatedStorage {
    async fn find_by_scope(
        &self,
        scope: &ScopeKey,
    ) -> RegistrationStorageResult<Option<RegistrationRecord>> {
        self.record(StorageCall::Find(scope.clone()));
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(RegistrationStorageError::persistence)?
                .forget();
        }
        assert!(
            !self.panic_next_find.swap(false, Ordering::SeqCst),
            "storage adapter crashed"
        );
        if self.fail_next_find.swap(false, Ordering::SeqCst) {
            return Err(RegistrationStorageError::persistence(std::io::Error::other(
                "lookup failed",
            )));
        }
        self.inner.find_by_scope(scope).await
    }

    async fn store(&self, record: &RegistrationRecord) -> RegistrationStorageResult<()> {
        self.record(StorageCall::Store(record.scope().clone()));
        self.inner.store(record).await
    }

    async fn delete(&self, scope: &ScopeKey) -> RegistrationStorageResult<()> {
        self.record(StorageCall::Delete(scope.clone()));
        self.inner.delete(scope).await
    }

    async fn list_all(&self) -> RegistrationStorageResult<Vec<RegistrationRecord>> {
        self.inner.list_all().await
    }
}

/// Callback forwarding the outcome to a receiver.
pub fn waiter() -> (CompletionCallback, oneshot::Receiver<JobOutcome>) {
    let (sender, receiver) = oneshot::channel();
    let callback: CompletionCallback = Box::new(move |outcome: &JobOutcome| {
        sender.send(outcome.clone()).ok();
    });
    (callback, receiver)
}

/// Callback appending `label` to a shared completion log.
pub fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> CompletionCallback {
    let sink = Arc::clone(log);
    Box::new(move |_: &JobOutcome| {
        sink.lock().unwrap_or_else(PoisonError::into_inner).push(label);
    })
}

/// Scope key fixture helper.
pub fn scope(value: &str) -> ScopeKey {
    ScopeKey::new(value).expect("valid scope")
}
