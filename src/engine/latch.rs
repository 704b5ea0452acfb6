// src/engine/latch.rs

//! First-error-wins failure latch.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::errors::SchedulerError;
use crate::types::JobId;

/// A job whose callable returned an error or panicked.
#[derive(Debug)]
pub struct JobFailure {
    pub job: JobId,
    pub error: anyhow::Error,
    /// `true` when the callable panicked rather than returning an error.
    pub panicked: bool,
}

impl JobFailure {
    pub fn new(job: JobId, error: anyhow::Error) -> Self {
        Self {
            job,
            error,
            panicked: false,
        }
    }

    pub fn from_panic(job: JobId, message: String) -> Self {
        Self {
            job,
            error: anyhow::anyhow!("job panicked: {message}"),
            panicked: true,
        }
    }

    /// A copy whose error is flattened to its rendered message, for handing
    /// to observers once the original has gone to the latch.
    pub fn detached(&self) -> Self {
        Self {
            job: self.job.clone(),
            error: anyhow::anyhow!("{:#}", self.error),
            panicked: self.panicked,
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job '{}' failed: {:#}", self.job, self.error)
    }
}

/// What stopped a run early.
///
/// Job failures are ordinary run outcomes; internal failures are scheduler
/// bugs or resource errors and are surfaced as [`SchedulerError`]s.
#[derive(Debug)]
pub enum RunFailure {
    Job(JobFailure),
    Internal(SchedulerError),
}

/// Single-assignment slot for the first failure of a run, plus the stop flag
/// every worker consults before starting a job.
#[derive(Debug, Default)]
pub struct FailureLatch {
    stopped: AtomicBool,
    slot: Mutex<Option<RunFailure>>,
}

impl FailureLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    ///
    /// Returns `true` only for the call that flips the latch from "running"
    /// to "stopped"; that call's failure is the one retained. Every later
    /// report is dropped.
    pub fn report(&self, failure: RunFailure) -> bool {
        let mut slot = self.lock();
        if self.stopped.load(Ordering::Acquire) {
            debug!(failure = ?failure, "latch already set; dropping later failure");
            return false;
        }

        match &failure {
            RunFailure::Job(f) => warn!(job = %f.job, error = %f.error, "job failed; stopping scheduler"),
            RunFailure::Internal(e) => warn!(error = %e, "internal scheduler failure; stopping scheduler"),
        }

        *slot = Some(failure);
        self.stopped.store(true, Ordering::Release);
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Take the retained failure, if any. The stop flag stays set.
    pub fn take(&self) -> Option<RunFailure> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<RunFailure>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
