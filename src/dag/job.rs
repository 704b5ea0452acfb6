// src/dag/job.rs

//! Jobs: an id plus an opaque callable.

use std::fmt;
use std::sync::Arc;

use crate::types::JobId;

/// Signature of the work a job performs.
///
/// The scheduler never inspects the callable; it only runs it once and
/// observes whether it returned an error (or panicked).
pub type JobFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// A unit of work handed to the scheduler.
///
/// Immutable once constructed. Cloning is cheap: the callable is shared.
#[derive(Clone)]
pub struct Job {
    id: JobId,
    work: Arc<JobFn>,
}

impl Job {
    pub fn new<F>(id: impl Into<JobId>, work: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            work: Arc::new(work),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Execute the job's callable on the current thread.
    pub fn run(&self) -> anyhow::Result<()> {
        (self.work)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
