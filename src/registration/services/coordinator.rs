//! Per-scope single-flight scheduling of registration jobs.
//!
//! The coordinator owns one [`ScopeQueue`] per scope key. A queue's head is
//! the only job of that scope touching storage; everything behind it waits
//! in submission order. Requests equivalent to a queued job are attached to
//! it instead of creating a new job, and every attached caller receives the
//! job's outcome when it finishes.
//!
//! All queue state lives behind one mutex. [`JobCoordinator::submit`] and
//! [`JobCoordinator::finish_job`] never suspend, and callbacks are always
//! invoked after the lock is released, so a callback may submit new work.

use super::{
    CoordinatorConfig, JobOutcome,
    protocol::run_job,
    queue::{QueueInvariantError, QueuedJob, ScopeQueue},
};
use crate::registration::{
    domain::{JobId, JobRequest, ScopeKey},
    ports::{RegistrationStorage, RegistrationStorageError},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::{
    runtime::Handle,
    sync::{Notify, oneshot},
};

/// Completion callback attached to a job by one caller.
pub type CompletionCallback = Box<dyn FnOnce(&JobOutcome) + Send + 'static>;

/// How the coordinator handled a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A new job was created and started immediately.
    Started(JobId),
    /// A new job was created behind other jobs for the same scope.
    Queued(JobId),
    /// The callback was attached to an existing equivalent job.
    Coalesced(JobId),
    /// The coordinator is shut down; the callback already ran with
    /// [`JobOutcome::Aborted`].
    Rejected,
}

impl Submission {
    /// Returns the job the callback is attached to.
    #[must_use]
    pub const fn job_id(self) -> Option<JobId> {
        match self {
            Self::Started(id) | Self::Queued(id) | Self::Coalesced(id) => Some(id),
            Self::Rejected => None,
        }
    }
}

#[derive(Default)]
struct CoordinatorState {
    queues: HashMap<ScopeKey, ScopeQueue>,
    next_job_id: u64,
    shut_down: bool,
}

struct CoordinatorInner<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    storage: Arc<S>,
    clock: Arc<C>,
    config: CoordinatorConfig,
    runtime: Handle,
    state: Mutex<CoordinatorState>,
    idle: Notify,
}

impl<S, C> CoordinatorInner<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serializes registration jobs per scope and fans out their outcomes.
///
/// Cloning is cheap; clones share the same queues.
pub struct JobCoordinator<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    inner: Arc<CoordinatorInner<S, C>>,
}

impl<S, C> Clone for JobCoordinator<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, C> JobCoordinator<S, C>
where
    S: RegistrationStorage + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a coordinator whose jobs run on `runtime`.
    #[must_use]
    pub fn new(
        storage: Arc<S>,
        clock: Arc<C>,
        config: CoordinatorConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                storage,
                clock,
                config,
                runtime,
                state: Mutex::new(CoordinatorState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Returns the coordinator configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Submits a request, attaching `callback` to the job that serves it.
    ///
    /// When an equivalent job is already queued for the scope, `callback` is
    /// attached to it. Otherwise a new job is appended to the scope's queue
    /// and started at once if the queue was empty. After
    /// [`shutdown`](Self::shutdown), `callback` runs immediately with
    /// [`JobOutcome::Aborted`].
    pub fn submit(&self, request: JobRequest, callback: CompletionCallback) -> Submission {
        let mut guard = self.inner.lock_state();
        let state = &mut *guard;

        if state.shut_down {
            drop(guard);
            tracing::debug!(scope = %request.scope(), kind = %request.kind(), "coordinator shut down; rejecting job");
            callback(&JobOutcome::Aborted);
            return Submission::Rejected;
        }

        let queue = state.queues.entry(request.scope().clone()).or_default();
        if let Some(existing) = queue.find_equivalent_mut(&request, self.inner.config.coalescing) {
            existing.attach(callback);
            let job_id = existing.id();
            tracing::debug!(
                scope = %request.scope(),
                kind = %request.kind(),
                %job_id,
                "coalesced request into queued job"
            );
            return Submission::Coalesced(job_id);
        }

        state.next_job_id += 1;
        let job_id = JobId::new(state.next_job_id);
        tracing::debug!(
            scope = %request.scope(),
            kind = %request.kind(),
            %job_id,
            depth = queue.len(),
            "queued registration job"
        );
        queue.push(QueuedJob::new(job_id, request, callback));
        let startable = queue.activate_head();
        drop(guard);

        match startable {
            Some((head_id, head_request)) => {
                self.start_job(head_id, head_request);
                Submission::Started(job_id)
            }
            None => Submission::Queued(job_id),
        }
    }

    /// Submits a request and waits for the outcome of the job serving it.
    pub async fn submit_and_wait(&self, request: JobRequest) -> JobOutcome {
        let (sender, receiver) = oneshot::channel();
        self.submit(
            request,
            Box::new(move |outcome: &JobOutcome| {
                if sender.send(outcome.clone()).is_err() {
                    tracing::trace!("caller stopped waiting for job outcome");
                }
            }),
        );
        receiver.await.unwrap_or(JobOutcome::Aborted)
    }

    /// Completes the active job `job_id` of `scope` with `outcome`.
    ///
    /// The job is removed from its queue and every attached callback runs in
    /// attachment order. An emptied queue is pruned; otherwise the next job
    /// for the scope is started.
    ///
    /// The coordinator calls this itself once a job's storage protocol has
    /// returned. Hosts must not call it: finishing a job whose protocol is
    /// still running starts the next job for the scope while the first is
    /// in flight, and the first job's own completion then trips the
    /// invariant check below.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when `job_id` is not the active head of the
    /// queue for `scope`. Release builds log the violation and leave the
    /// queues untouched.
    pub fn finish_job(&self, scope: &ScopeKey, job_id: JobId, outcome: JobOutcome) {
        let (finished, next, now_idle) = {
            let mut guard = self.inner.lock_state();
            let Some(queue) = guard.queues.get_mut(scope) else {
                drop(guard);
                invariant_violation(scope, job_id, &QueueInvariantError::Empty);
                return;
            };
            let finished = match queue.pop_finished(job_id) {
                Ok(finished) => finished,
                Err(err) => {
                    drop(guard);
                    invariant_violation(scope, job_id, &err);
                    return;
                }
            };
            let next = queue.activate_head();
            if queue.is_empty() {
                guard.queues.remove(scope);
                tracing::debug!(scope = %scope, "pruned empty scope queue");
            }
            (finished, next, guard.queues.is_empty())
        };

        tracing::debug!(
            scope = %scope,
            kind = %finished.request().kind(),
            %job_id,
            status = %outcome.status(),
            callbacks = finished.callback_count(),
            "registration job finished"
        );
        finished.complete(&outcome);

        if let Some((next_id, next_request)) = next {
            self.start_job(next_id, next_request);
        }
        if now_idle {
            self.inner.idle.notify_waiters();
        }
    }

    /// Stops accepting work and aborts every job that has not started.
    ///
    /// Pending jobs complete with [`JobOutcome::Aborted`]. Active jobs are
    /// not cancelled and still deliver their real outcome. Later submissions
    /// are rejected. Returns the number of aborted jobs.
    pub fn shutdown(&self) -> usize {
        let (aborted, now_idle) = {
            let mut guard = self.inner.lock_state();
            guard.shut_down = true;
            let aborted: Vec<QueuedJob> = guard
                .queues
                .values_mut()
                .flat_map(ScopeQueue::drain_pending)
                .collect();
            guard.queues.retain(|_, queue| !queue.is_empty());
            (aborted, guard.queues.is_empty())
        };

        tracing::info!(aborted = aborted.len(), "job coordinator shutting down");
        let count = aborted.len();
        let outcome = JobOutcome::Aborted;
        for job in aborted {
            job.complete(&outcome);
        }
        if now_idle {
            self.inner.idle.notify_waiters();
        }
        count
    }

    /// Waits until no scope has queued or active jobs.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Returns `true` when no jobs are queued or running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.lock_state().queues.is_empty()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock_state().shut_down
    }

    /// Returns the number of scopes with queued or running jobs.
    #[must_use]
    pub fn tracked_scopes(&self) -> usize {
        self.inner.lock_state().queues.len()
    }

    /// Returns the number of jobs queued for `scope`, the active one included.
    #[must_use]
    pub fn queue_depth(&self, scope: &ScopeKey) -> usize {
        self.inner
            .lock_state()
            .queues
            .get(scope)
            .map_or(0, ScopeQueue::len)
    }

    /// Returns the job currently running for `scope`.
    #[must_use]
    pub fn active_job(&self, scope: &ScopeKey) -> Option<JobId> {
        self.inner
            .lock_state()
            .queues
            .get(scope)
            .and_then(ScopeQueue::active_job)
    }

    fn start_job(&self, job_id: JobId, request: JobRequest) {
        let scope = request.scope().clone();
        tracing::debug!(scope = %scope, kind = %request.kind(), %job_id, "starting registration job");

        let execution = self.inner.runtime.spawn(run_job(
            request,
            Arc::clone(&self.inner.storage),
            Arc::clone(&self.inner.clock),
        ));
        let coordinator = self.clone();
        self.inner.runtime.spawn(async move {
            let outcome = execution.await.unwrap_or_else(|join_error| {
                tracing::error!(scope = %scope, %job_id, error = %join_error, "registration job aborted abnormally");
                JobOutcome::StorageError(RegistrationStorageError::persistence(join_error))
            });
            coordinator.finish_job(&scope, job_id, outcome);
        });
    }
}

fn invariant_violation(scope: &ScopeKey, job_id: JobId, err: &QueueInvariantError) {
    tracing::error!(scope = %scope, %job_id, error = %err, "finish_job called for a job that is not the active head");
    if cfg!(debug_assertions) {
        panic!("job coordinator invariant violated for scope {scope}: {err}");
    }
}
