//! Per-scope FIFO of registration jobs.

use super::{CoalescingPolicy, CompletionCallback, JobOutcome};
use crate::registration::domain::{JobId, JobRequest};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Pending,
    Active,
}

/// A job owned by its scope queue, with every caller attached to it.
pub(super) struct QueuedJob {
    id: JobId,
    request: JobRequest,
    state: JobState,
    callbacks: Vec<CompletionCallback>,
}

impl QueuedJob {
    pub(super) fn new(id: JobId, request: JobRequest, callback: CompletionCallback) -> Self {
        Self {
            id,
            request,
            state: JobState::Pending,
            callbacks: vec![callback],
        }
    }

    pub(super) const fn id(&self) -> JobId {
        self.id
    }

    pub(super) const fn request(&self) -> &JobRequest {
        &self.request
    }

    pub(super) fn attach(&mut self, callback: CompletionCallback) {
        self.callbacks.push(callback);
    }

    pub(super) fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Invokes every attached callback in attachment order.
    ///
    /// A panicking callback is logged and does not prevent the remaining
    /// callbacks from running.
    pub(super) fn complete(self, outcome: &JobOutcome) {
        let job_id = self.id;
        for (position, callback) in self.callbacks.into_iter().enumerate() {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(outcome))).is_err() {
                tracing::error!(
                    %job_id,
                    callback = position,
                    status = %outcome.status(),
                    "completion callback panicked"
                );
            }
        }
    }

    const fn is_active(&self) -> bool {
        matches!(self.state, JobState::Active)
    }
}

/// Reasons a finished job cannot be removed from its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(super) enum QueueInvariantError {
    /// The queue holds no jobs.
    #[error("queue is empty")]
    Empty,
    /// The finishing job is not the queue head.
    #[error("{finished} is not the queue head ({head} is)")]
    NotHead { finished: JobId, head: JobId },
    /// The head was never started.
    #[error("{0} finished without being started")]
    NotStarted(JobId),
}

/// Ordered jobs for one scope; only the head is ever active.
#[derive(Default)]
pub(super) struct ScopeQueue {
    jobs: VecDeque<QueuedJob>,
}

impl ScopeQueue {
    pub(super) fn len(&self) -> usize {
        self.jobs.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns the job a new `request` should be coalesced into, if any.
    ///
    /// The active head only qualifies while it is also the tail.
    pub(super) fn find_equivalent_mut(
        &mut self,
        request: &JobRequest,
        policy: CoalescingPolicy,
    ) -> Option<&mut QueuedJob> {
        match policy {
            CoalescingPolicy::AnyQueued => {
                let len = self.jobs.len();
                self.jobs
                    .iter_mut()
                    .enumerate()
                    .find(|(position, job)| {
                        (!job.is_active() || position + 1 == len)
                            && job.request.is_equivalent(request)
                    })
                    .map(|(_, job)| job)
            }
            CoalescingPolicy::TailOnly => self
                .jobs
                .back_mut()
                .filter(|job| job.request.is_equivalent(request)),
        }
    }

    /// Appends a job at the tail.
    pub(super) fn push(&mut self, job: QueuedJob) {
        self.jobs.push_back(job);
    }

    /// Marks a pending head active and returns what must be started.
    ///
    /// Returns `None` when the queue is empty or the head is already active,
    /// so a head is started at most once.
    pub(super) fn activate_head(&mut self) -> Option<(JobId, JobRequest)> {
        let head = self.jobs.front_mut()?;
        if head.is_active() {
            return None;
        }
        head.state = JobState::Active;
        Some((head.id, head.request.clone()))
    }

    /// Returns the identifier of the active head.
    pub(super) fn active_job(&self) -> Option<JobId> {
        self.jobs
            .front()
            .filter(|job| job.is_active())
            .map(QueuedJob::id)
    }

    /// Removes the active head, which must be `finished`.
    pub(super) fn pop_finished(&mut self, finished: JobId) -> Result<QueuedJob, QueueInvariantError> {
        let head = self.jobs.front().ok_or(QueueInvariantError::Empty)?;
        if head.id != finished {
            return Err(QueueInvariantError::NotHead {
                finished,
                head: head.id,
            });
        }
        if !head.is_active() {
            return Err(QueueInvariantError::NotStarted(finished));
        }
        self.jobs.pop_front().ok_or(QueueInvariantError::Empty)
    }

    /// Removes every job that has not started, preserving their order.
    pub(super) fn drain_pending(&mut self) -> Vec<QueuedJob> {
        let (active, pending): (VecDeque<_>, VecDeque<_>) =
            self.jobs.drain(..).partition(QueuedJob::is_active);
        self.jobs = active;
        Vec::from(pending)
    }
}
